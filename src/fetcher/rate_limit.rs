//! Rate-limit signal detection and backoff computation
//!
//! GitHub reports exhaustion with a 403 or 429 whose `x-ratelimit-remaining`
//! header reads `0`. The wait comes from `retry-after` (relative seconds) when
//! present, otherwise from `x-ratelimit-reset` (absolute epoch seconds).

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

use crate::fetcher::config::RATE_LIMIT_MARGIN;

/// Header carrying the remaining request quota
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";

/// Header carrying the quota reset time (Unix seconds)
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Header carrying a relative retry delay in seconds
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Directive extracted from a rate-limited response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitSignal {
    /// Retry after this many seconds
    RetryAfter(u64),
    /// Quota resets at this Unix timestamp (seconds)
    ResetAt(i64),
    /// Quota is exhausted but the response carried no usable timing
    Unspecified,
}

impl RateLimitSignal {
    /// Inspect a response; `None` means the response is not a rate-limit signal
    pub fn from_response(status: StatusCode, headers: &HeaderMap) -> Option<Self> {
        if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
            return None;
        }

        if header_str(headers, HEADER_REMAINING)? != "0" {
            return None;
        }

        if let Some(secs) = header_str(headers, HEADER_RETRY_AFTER).and_then(|v| v.parse().ok()) {
            return Some(Self::RetryAfter(secs));
        }

        if let Some(reset) = header_str(headers, HEADER_RESET).and_then(|v| v.parse().ok()) {
            return Some(Self::ResetAt(reset));
        }

        Some(Self::Unspecified)
    }

    /// Compute how long to sleep before retrying
    ///
    /// The raw wait gets [`RATE_LIMIT_MARGIN`] added and is then clamped to
    /// `max_wait`.
    pub fn wait_duration(&self, now: DateTime<Utc>, max_wait: Duration) -> Duration {
        let base = match *self {
            Self::RetryAfter(secs) => Duration::from_secs(secs),
            Self::ResetAt(reset) => {
                Duration::from_secs(u64::try_from(reset.saturating_sub(now.timestamp())).unwrap_or(0))
            }
            Self::Unspecified => Duration::ZERO,
        };

        base.saturating_add(RATE_LIMIT_MARGIN).min(max_wait)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok().map(str::trim)
}
