// ABOUTME: Local filesystem enumeration used by upload workflows.
// ABOUTME: Walks a directory tree and returns every file path found.

use super::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List all files under a directory, recursively.
///
/// Directories themselves are not returned, only the files inside them, at
/// any depth. Walk errors (unreadable entries, broken symlinks) surface as
/// I/O errors rather than being skipped.
pub fn list_local_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
