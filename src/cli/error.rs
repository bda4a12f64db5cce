//! CLI error types and conversions

use crate::archive::ArchiveError;
use crate::fetcher::FetcherError;
use crate::metrics::MetricsError;
use crate::repo::RepoError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The repository URL could not be parsed
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// The HTTP client could not be built
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// The run failed as a whole
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// The metrics exporter could not start
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// The run finished but some items failed; re-run to retry them
    #[error("{} item(s) failed: {}", .0.len(), .0.join(", "))]
    ItemsFailed(Vec<String>),

    /// A shutdown request stopped the run early; re-run to resume
    #[error("interrupted before all items were processed")]
    Interrupted,
}
