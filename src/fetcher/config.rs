//! GitHub API configuration
//!
//! Constants shared by the transport and paginator, plus [`ClientConfig`],
//! the runtime knobs a caller may override (base URL, token, retry budget).

use std::time::Duration;

/// Default REST API base URL
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Default host used to build `git clone` URLs
pub const GITHUB_CLONE_URL: &str = "https://github.com";

/// Media type requested for JSON endpoints
pub const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Media type requested for the rendered readme
pub const ACCEPT_HTML: &str = "application/vnd.github.html+json";

/// Largest page size the API accepts for list endpoints
pub const PER_PAGE: u32 = 100;

/// Default number of attempts per request (first try included).
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default ceiling on a single rate-limit sleep.
///
/// The primary limit resets hourly, so an hour is the longest wait that can
/// ever be meaningful.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3600);

/// Added to every computed rate-limit wait to absorb clock skew
pub const RATE_LIMIT_MARGIN: Duration = Duration::from_secs(1);

/// Identifier sent as `User-Agent` and stamped into manifests
pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Runtime configuration for [`GithubHttpClient`](super::github_http::GithubHttpClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Bearer token; `None` for anonymous access
    pub token: Option<String>,
    /// Maximum attempts per request while rate limited
    pub max_retries: u32,
    /// Upper bound on one rate-limit sleep
    pub max_wait: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            token: None,
            max_retries: DEFAULT_MAX_RETRIES,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl ClientConfig {
    /// Override the API base URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate requests with a token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Set the attempt budget (clamped to at least one attempt)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the ceiling for a single rate-limit sleep
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}
