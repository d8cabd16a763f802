// ABOUTME: Directory listing command implementation.
// ABOUTME: Lists remote directories over SFTP or local directories recursively.

use skiff::error::Result;
use skiff::output::Output;
use skiff::session::{self, Session, SessionConfig};
use std::path::Path;

/// List the immediate entries of a remote directory.
pub async fn list_entries(config: SessionConfig, dir: &str, output: &Output) -> Result<()> {
    output.progress(&format!("Connecting to {}...", config.host));
    let mut session = Session::connect(config).await?;

    let result = session.list_remote_entries(dir).await;
    session.disconnect().await?;

    for name in result? {
        println!("{name}");
    }
    Ok(())
}

/// List files under a local directory, recursively. Needs no connection.
pub fn list_local(dir: &str) -> Result<()> {
    for path in session::list_local_entries(Path::new(dir))? {
        println!("{}", path.display());
    }
    Ok(())
}
