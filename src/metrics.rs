//! Observability metrics
//!
//! Counters and histograms are emitted through the `metrics` facade at all
//! times; they only become visible when [`init_metrics`] installs the
//! Prometheus exporter (see `--metrics-addr`). Without an exporter the calls
//! are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Install the Prometheus exporter with an HTTP scrape listener
///
/// Idempotent: later calls after a successful install are ignored. Must be
/// called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(addr = %existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "HTTP requests sent to the GitHub API, by status"
    );
    describe_counter!(
        "http_rate_limited_total",
        Unit::Count,
        "Responses that signalled an exhausted rate limit"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time slept waiting for the rate limit to reset"
    );
    describe_counter!(
        "archive_items_total",
        Unit::Count,
        "Archive items processed, by final state"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!(addr = %addr, "Metrics exporter listening");
    Ok(())
}

/// Count one HTTP response
pub fn record_http_request(status: u16) {
    counter!("http_requests_total", "status" => status.to_string()).increment(1);
}

/// Count one rate-limit backoff and how long it slept
pub fn record_rate_limit_wait(wait: Duration) {
    counter!("http_rate_limited_total").increment(1);
    histogram!("rate_limit_wait_seconds").record(wait.as_secs_f64());
}

/// Count one archive item reaching its final state
pub fn record_item(state: &'static str) {
    counter!("archive_items_total", "state" => state).increment(1);
}
