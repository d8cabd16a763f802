// ABOUTME: Application-wide error types for skiff.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing connection option '{0}': set it in skiff.yml or pass --{0}")]
    MissingOption(&'static str),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("remote command '{command}' exited with code {exit_code}")]
    RemoteCommand { command: String, exit_code: u32 },

    #[error(transparent)]
    Session(#[from] crate::session::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
