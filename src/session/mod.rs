// ABOUTME: Remote session module: SSH transport plus SFTP transfer channel.
// ABOUTME: Supports key and password authentication with known_hosts verification.

mod client;
mod error;
mod local;
mod transfer;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
pub use local::list_local_entries;
pub use transfer::TransferChannel;
