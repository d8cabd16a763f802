// ABOUTME: SFTP transfer channel derived from an established transport.
// ABOUTME: Covers directory listing, upload, download, and in-memory reads/writes.

use super::client::HostVerifier;
use super::error::{Error, Result};
use russh::client::Handle;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A file-transfer sub-channel over the session's transport.
///
/// Owned by the `Session` that opened it; closed before or alongside the
/// transport on disconnect.
pub struct TransferChannel {
    sftp: SftpSession,
}

impl TransferChannel {
    /// Open the SFTP subsystem on a new channel over the given transport.
    pub(crate) async fn open(handle: &Handle<HostVerifier>) -> Result<Self> {
        let channel = handle
            .channel_open_session()
            .await
            .map_err(Error::Protocol)?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(Error::Protocol)?;
        let sftp = SftpSession::new(channel.into_stream()).await?;
        Ok(Self { sftp })
    }

    /// List entry names of a remote directory. No filtering beyond dropping
    /// the `.` and `..` pseudo-entries, no pagination.
    pub async fn list_dir(&self, dir: &str) -> Result<Vec<String>> {
        let entries = self.sftp.read_dir(dir).await?;
        let mut names = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }

    /// Copy a local file to a remote path.
    pub async fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        let contents = tokio::fs::read(local).await.map_err(Error::Io)?;
        self.write(&contents, remote).await?;
        tracing::debug!("uploaded {} -> {}", local.display(), remote);
        Ok(())
    }

    /// Write in-memory bytes to a remote path, creating or truncating it.
    pub async fn write(&self, content: &[u8], remote: &str) -> Result<()> {
        let mut file = self
            .sftp
            .open_with_flags(
                remote,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await?;
        file.write_all(content).await.map_err(Error::Io)?;
        file.flush().await.map_err(Error::Io)?;
        file.shutdown().await.map_err(Error::Io)?;
        Ok(())
    }

    /// Read a remote file fully into memory. The file is stat'd first so the
    /// buffer can be sized up front instead of growing during the read.
    pub async fn read_file(&self, remote: &str) -> Result<Vec<u8>> {
        let attrs = self.sftp.metadata(remote).await?;
        let size = attrs.size.unwrap_or(0) as usize;

        let mut file = self.sftp.open_with_flags(remote, OpenFlags::READ).await?;
        let mut contents = Vec::with_capacity(size);
        file.read_to_end(&mut contents).await.map_err(Error::Io)?;
        Ok(contents)
    }

    /// Copy a remote file to a local path.
    pub async fn download(&self, remote: &str, local: &Path) -> Result<()> {
        let contents = self.read_file(remote).await?;
        tokio::fs::write(local, contents).await.map_err(Error::Io)?;
        tracing::debug!("downloaded {} -> {}", remote, local.display());
        Ok(())
    }

    /// Close the SFTP channel.
    pub async fn close(self) -> Result<()> {
        self.sftp.close().await?;
        Ok(())
    }
}
