//! GitHub REST API access
//!
//! - [`github_http`] - the retrying transport
//! - [`pagination`] - `Link`-header cursor walking
//! - [`rate_limit`] - rate-limit signal detection and wait computation
//! - [`config`] - endpoint constants and client configuration

use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

pub mod config;
pub mod github_http;
pub mod pagination;
pub mod rate_limit;

pub use config::ClientConfig;
pub use github_http::{GithubHttpClient, RequestOptions};
pub use pagination::Paginator;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Non-2xx response after the retry budget was spent
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Connection-level failure (not retried)
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// A shutdown request interrupted a rate-limit wait
    #[error("shutdown requested")]
    Shutdown,
}

impl FetcherError {
    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server answered 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether this is GitHub's "pagination is limited for this resource" 422
    pub fn is_pagination_limit(&self) -> bool {
        match self {
            Self::Http { status: 422, body } => body.to_lowercase().contains("pagination is limited"),
            _ => false,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Lazy sequence of JSON items produced by the paginator
pub type ItemStream = Pin<Box<dyn Stream<Item = FetcherResult<Value>> + Send>>;

/// Outcome of fetching one archive item
///
/// Absence is only a soft outcome when the caller said it may be expected;
/// otherwise a 404 stays an [`FetchOutcome::Error`].
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// The payload was fetched
    Success(T),
    /// The resource does not exist and that was anticipated
    NotFound,
    /// Any other failure
    Error(FetcherError),
}

impl<T> FetchOutcome<T> {
    /// Classify a fetch result
    pub fn from_result(result: FetcherResult<T>, expect_missing: bool) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(e) if expect_missing && e.is_not_found() => Self::NotFound,
            Err(e) => Self::Error(e),
        }
    }
}
