// ABOUTME: Command module aggregator for the skiff CLI.
// ABOUTME: Re-exports exec, transfer, and listing command handlers.

mod exec;
mod list;
mod transfer;

pub use exec::exec_commands;
pub use list::{list_entries, list_local};
pub use transfer::{cat_file, download_file, upload_file, write_file};
