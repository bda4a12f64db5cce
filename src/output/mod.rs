//! Archive output
//!
//! Everything written into an archive directory goes through
//! [`write_atomic`]: the bytes land in a temporary file beside the target,
//! are synced, and are then renamed over the target. A reader (or a resumed
//! run) therefore sees either the previous file or the complete new one.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

pub mod path;

pub use path::ArchiveLayout;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error writing {path}: {message}")]
    Io {
        /// Target path
        path: String,
        /// Underlying error
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

fn io_error(path: &Path, e: impl std::fmt::Display) -> OutputError {
    OutputError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Write `contents` to `path` atomically
///
/// The parent directory is created if missing.
pub fn write_atomic(path: &Path, contents: &[u8]) -> OutputResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(|e| io_error(path, e))?;
    temp_file.write_all(contents).map_err(|e| io_error(path, e))?;
    temp_file.flush().map_err(|e| io_error(path, e))?;
    temp_file.as_file().sync_all().map_err(|e| io_error(path, e))?;
    temp_file.persist(path).map_err(|e| io_error(path, e.error))?;

    // Make the rename itself durable
    if let Err(e) = sync_dir(parent) {
        warn!(path = %parent.display(), error = %e, "Failed to sync directory after rename");
    }

    debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
    Ok(())
}

/// Flush a directory's entries (renames, creations) to disk
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

/// Serialize `value` as indented JSON and write it atomically
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let json =
        serde_json::to_vec_pretty(value).map_err(|e| OutputError::Serialization(e.to_string()))?;
    write_atomic(path, &json)
}
