//! Advisory lock on an archive directory
//!
//! Two runs writing the same archive could clobber each other's artifacts and
//! manifest. A running archive holds an exclusive `fd-lock` on
//! `manifest.lock`; a second run fails fast instead of waiting.

use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock errors
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The lock file could not be opened
    #[error("failed to open lock file {path}: {message}")]
    Open {
        /// Lock file path
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// Another process holds the lock
    #[error("archive directory is in use by another run (lock: {0})")]
    Busy(PathBuf),
}

/// Handle on an archive directory's lock file
pub struct ArchiveLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl ArchiveLock {
    /// Open (creating if needed) the lock file at `path`
    pub fn open(path: &Path) -> Result<Self, LockError> {
        let open_error = |e: std::io::Error| LockError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(open_error)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(open_error)?;

        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(file),
        })
    }

    /// Take the exclusive lock without blocking
    ///
    /// The lock is released when the returned guard is dropped.
    pub fn try_exclusive(&mut self) -> Result<RwLockWriteGuard<'_, File>, LockError> {
        let path = self.path.clone();
        self.lock.try_write().map_err(|_| LockError::Busy(path))
    }
}

impl std::fmt::Debug for ArchiveLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveLock").field("path", &self.path).finish()
    }
}
