//! File persistence primitives shared by the task store and sync state.
//!
//! Writes are plain whole-file replacements. There is no cross-file
//! transaction; callers that need stricter atomicity must layer a
//! temp-file-rename strategy on top of these primitives.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A failed durability flush.
///
/// Non-fatal by design: in-memory state stays authoritative and callers
/// surface this as a warning rather than aborting.
#[derive(Debug, Error)]
#[error("failed to persist {}: {source}", path.display())]
pub struct PersistenceError {
    /// File that could not be read or written.
    pub path: PathBuf,
    /// Underlying I/O error.
    pub source: io::Error,
}

impl PersistenceError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes `contents` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns a [`PersistenceError`] if the directory cannot be created or
/// the file cannot be written.
pub fn write_file(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::new(path, e))?;
        }
    }
    std::fs::write(path, contents).map_err(|e| PersistenceError::new(path, e))
}

/// Reads `path` to a string, treating a missing file as `None`.
///
/// # Errors
///
/// Returns a [`PersistenceError`] for any I/O failure other than the file
/// not existing.
pub fn read_file_if_exists(path: &Path) -> Result<Option<String>, PersistenceError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PersistenceError::new(path, e)),
    }
}
