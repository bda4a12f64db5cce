//! # gitspoke
//!
//! Resumable archiving of a GitHub repository into a local directory: the
//! full git history and wiki as bundles, the rendered readme, and the JSON
//! of issues, pull requests, releases and the other repository endpoints.
//!
//! ## Features
//!
//! - **Resumable**: a manifest records what is finished; re-runs skip it and
//!   retry only what failed
//! - **Rate-limit aware**: rate-limited responses are waited out and resent
//! - **Atomic writes**: artifacts appear complete or not at all
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gitspoke::archive::{Archiver, GitMirror, Selection};
//! use gitspoke::fetcher::{ClientConfig, GithubHttpClient};
//! use gitspoke::output::ArchiveLayout;
//! use gitspoke::repo::RepoRef;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = RepoRef::parse("https://github.com/octocat/Hello-World")?;
//! let client = GithubHttpClient::new(ClientConfig::default())?;
//! let archiver = Archiver::new(client, Arc::new(GitMirror::new()));
//!
//! let layout = ArchiveLayout::new("./octocat/Hello-World");
//! let report = archiver.archive(&repo, &layout, &Selection::all()).await?;
//! println!("failed items: {:?}", report.failed());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - retrying transport and `Link` pagination over the REST API
//! - [`resume`] - the manifest and the archive directory lock
//! - [`archive`] - the item catalog, git mirroring and the run itself
//! - [`output`] - archive layout and atomic file writes
//! - [`repo`] - repository URL parsing

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Repository archiving
pub mod archive;

/// CLI command implementations
pub mod cli;

/// GitHub REST API access
pub mod fetcher;

/// Prometheus metrics
pub mod metrics;

/// Archive layout and atomic writes
pub mod output;

/// Repository reference parsing
pub mod repo;

/// Resume support
pub mod resume;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

pub use repo::RepoRef;
