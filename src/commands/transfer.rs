// ABOUTME: File transfer command implementations.
// ABOUTME: Handles upload, download, stdin writes, and remote reads.

use skiff::error::Result;
use skiff::output::Output;
use skiff::session::{Session, SessionConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Upload a local file to the remote host.
pub async fn upload_file(
    config: SessionConfig,
    local: &Path,
    remote: &str,
    output: &mut Output,
) -> Result<()> {
    output.progress(&format!("Connecting to {}...", config.host));
    let mut session = Session::connect(config).await?;
    output.start_timer();

    let result = session.upload_file(local, remote).await;
    session.disconnect().await?;
    result?;

    output.success(&format!("Uploaded {} -> {}", local.display(), remote));
    Ok(())
}

/// Download a remote file. Without an explicit local path the remote file
/// name is used in the current directory.
pub async fn download_file(
    config: SessionConfig,
    remote: &str,
    local: Option<PathBuf>,
    output: &mut Output,
) -> Result<()> {
    let local = match local {
        Some(path) => path,
        None => {
            let name = remote.rsplit('/').next().unwrap_or(remote);
            PathBuf::from(name)
        }
    };

    output.progress(&format!("Connecting to {}...", config.host));
    let mut session = Session::connect(config).await?;
    output.start_timer();

    let result = session.download_file(remote, &local).await;
    session.disconnect().await?;
    result?;

    output.success(&format!("Downloaded {} -> {}", remote, local.display()));
    Ok(())
}

/// Write everything from stdin to a remote file.
pub async fn write_file(config: SessionConfig, remote: &str, output: &mut Output) -> Result<()> {
    let mut content = Vec::new();
    tokio::io::stdin().read_to_end(&mut content).await?;

    output.progress(&format!("Connecting to {}...", config.host));
    let mut session = Session::connect(config).await?;
    output.start_timer();

    let result = session.write_to_remote_file(&content, remote).await;
    session.disconnect().await?;
    result?;

    output.success(&format!("Wrote {} bytes to {}", content.len(), remote));
    Ok(())
}

/// Print a remote file to stdout.
pub async fn cat_file(config: SessionConfig, remote: &str, output: &Output) -> Result<()> {
    output.progress(&format!("Connecting to {}...", config.host));
    let mut session = Session::connect(config).await?;

    let result = session.open_file(remote).await;
    session.disconnect().await?;
    let contents = result?;

    std::io::stdout().write_all(&contents)?;
    Ok(())
}
