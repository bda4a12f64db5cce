//! Resume support for archive runs
//!
//! [`Manifest`] records which items are finished; [`ArchiveLock`] keeps two
//! runs from sharing one archive directory.

pub mod lock;
pub mod manifest;

pub use lock::{ArchiveLock, LockError};
pub use manifest::{ItemStatus, Manifest, ManifestEntry, ManifestError};
