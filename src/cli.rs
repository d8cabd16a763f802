// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Remote command execution and SFTP file transfer over SSH")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (CI friendly)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON lines output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection options, overriding whatever skiff.yml provides.
#[derive(Args)]
pub struct ConnectionArgs {
    /// Target as [user@]host[:port]
    #[arg(short = 't', long, global = true)]
    pub target: Option<String>,

    /// Remote host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Username for authentication
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// SSH port
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Path to a private key file
    #[arg(short = 'i', long, global = true)]
    pub key_path: Option<PathBuf>,

    /// Name of an environment variable holding the password
    #[arg(long, global = true)]
    pub password_env: Option<String>,

    /// Accept unknown host keys (trust on first use)
    #[arg(long, global = true)]
    pub trust: bool,

    /// Connection timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub connect_timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a skiff.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Execute one or more commands on the remote host
    Exec {
        /// Commands to run, each argument is one command
        #[arg(required = true)]
        commands: Vec<String>,

        /// Environment variables as KEY=VALUE, applied to every command
        #[arg(short, long)]
        env: Vec<String>,
    },

    /// Upload a local file to the remote host
    Upload {
        /// Local file to upload
        local: PathBuf,
        /// Remote destination path
        remote: String,
    },

    /// Download a remote file to a local path
    Download {
        /// Remote file to download
        remote: String,
        /// Local destination (defaults to the remote file name)
        local: Option<PathBuf>,
    },

    /// List entries of a directory
    #[command(alias = "ls")]
    List {
        /// Directory to list
        dir: String,
        /// List a local directory recursively instead of a remote one
        #[arg(long)]
        local: bool,
    },

    /// Write stdin to a remote file
    Write {
        /// Remote destination path
        remote: String,
    },

    /// Print a remote file to stdout
    Cat {
        /// Remote file to read
        remote: String,
    },
}
