//! Repository archiving
//!
//! - [`catalog`] - the fixed set of archive items and the inclusion selector
//! - [`mirror`] - git bundle creation
//! - [`orchestrator`] - the resumable run over the catalog

use std::fmt;

use crate::fetcher::FetcherError;
use crate::output::OutputError;
use crate::resume::{LockError, ManifestError};

pub mod catalog;
pub mod mirror;
pub mod orchestrator;

pub use catalog::{ArchiveItem, FetchMode, PlannedItem, Selection, SelectionError};
pub use mirror::{GitMirror, MirrorError, MirrorOutcome, MirrorService};
pub use orchestrator::Archiver;

/// Run-level failures
///
/// Individual items never produce these; they are recorded in the manifest
/// and reported through [`ArchiveReport`].
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The repository does not exist or is not visible
    #[error("repository {0} not found")]
    RepoNotFound(String),

    /// Repository metadata could not be fetched
    #[error("failed to fetch repository info: {0}")]
    RepoInfo(#[source] FetcherError),

    /// Writing into the archive directory failed
    #[error(transparent)]
    Io(#[from] OutputError),

    /// The manifest could not be saved
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The archive directory is locked or the lock is unusable
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Final state of one item in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemState {
    /// Already complete from an earlier run
    Skipped,
    /// Fetched and written
    Succeeded,
    /// Absent upstream; recorded as such
    NotFound,
    /// Failed; will be retried by the next run
    Failed(String),
}

impl ItemState {
    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            ItemState::Skipped => "skipped",
            ItemState::Succeeded => "succeeded",
            ItemState::NotFound => "not_found",
            ItemState::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Outcome of one archive run
#[derive(Debug, Clone, Default)]
pub struct ArchiveReport {
    items: Vec<(String, ItemState)>,
    interrupted: bool,
}

impl ArchiveReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item's final state
    pub fn push(&mut self, name: &str, state: ItemState) {
        self.items.push((name.to_string(), state));
    }

    /// Mark the run as stopped early by a shutdown request
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Items in processing order
    pub fn items(&self) -> &[(String, ItemState)] {
        &self.items
    }

    /// State of a single item
    pub fn state(&self, name: &str) -> Option<&ItemState> {
        self.items.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Names of failed items
    pub fn failed(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|(_, s)| matches!(s, ItemState::Failed(_)))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Number of items whose label is `label`
    pub fn count(&self, label: &str) -> usize {
        self.items.iter().filter(|(_, s)| s.label() == label).count()
    }

    /// Whether a shutdown request cut the run short
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Whether every processed item ended in a terminal state
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.failed().is_empty()
    }
}
