//! Retrying HTTP transport for the GitHub REST API
//!
//! Every request goes through [`GithubHttpClient::send`], which absorbs
//! rate-limit responses by sleeping and resending the identical request, up
//! to the configured attempt budget. Only rate limiting is retried: 5xx
//! responses and connection errors are reported to the caller on the first
//! occurrence.

use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fetcher::config::{user_agent, ClientConfig, ACCEPT_JSON};
use crate::fetcher::rate_limit::RateLimitSignal;
use crate::fetcher::{FetcherError, FetcherResult};
use crate::metrics;
use crate::shutdown::{self, SharedShutdown};

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra query parameters, appended to any already present in the path
    pub query: Vec<(String, String)>,
    /// Overrides the default `Accept` media type
    pub accept: Option<&'static str>,
}

impl RequestOptions {
    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Request a specific media type
    pub fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }
}

/// HTTP client bound to one API base URL and credential
#[derive(Clone)]
pub struct GithubHttpClient {
    client: Arc<Client>,
    config: ClientConfig,
    shutdown: Option<SharedShutdown>,
}

impl GithubHttpClient {
    /// Create a client with its own connection pool
    pub fn new(config: ClientConfig) -> FetcherResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(|e| FetcherError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Create a client over a shared `reqwest` client
    pub fn with_client(client: Arc<Client>, config: ClientConfig) -> Self {
        Self {
            client,
            config,
            shutdown: shutdown::get_global_shutdown(),
        }
    }

    /// Attach a shutdown handle that can interrupt rate-limit sleeps
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve a path against the API base; absolute URLs pass through.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.config.api_url, path.trim_start_matches('/'))
        }
    }

    fn build_request(&self, url: &str, method: Method, options: &RequestOptions) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, options.accept.unwrap_or(ACCEPT_JSON));

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        request
    }

    /// Send one request, waiting out rate limits
    ///
    /// # Errors
    /// - [`FetcherError::Http`] if the final response is not 2xx
    /// - [`FetcherError::Network`] on a connection failure
    /// - [`FetcherError::Shutdown`] if shutdown interrupts a rate-limit wait
    pub async fn send(
        &self,
        path: &str,
        method: Method,
        options: &RequestOptions,
    ) -> FetcherResult<Response> {
        let url = self.resolve_url(path);
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(url = %url, attempt, max_attempts, "Sending request");

            let response = self
                .build_request(&url, method.clone(), options)
                .send()
                .await
                .map_err(|e| FetcherError::Network(e.to_string()))?;

            let status = response.status();
            metrics::record_http_request(status.as_u16());

            if let Some(signal) = RateLimitSignal::from_response(status, response.headers()) {
                if attempt < max_attempts {
                    let wait = signal.wait_duration(Utc::now(), self.config.max_wait);
                    warn!(
                        url = %url,
                        status = status.as_u16(),
                        attempt,
                        max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        "Rate limited, waiting before retry"
                    );
                    metrics::record_rate_limit_wait(wait);

                    if !shutdown::sleep_or_shutdown(wait, self.shutdown.as_ref()).await {
                        return Err(FetcherError::Shutdown);
                    }
                    continue;
                }
                warn!(url = %url, attempt, "Rate limited and out of retries");
            }

            if status.is_success() {
                return Ok(response);
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(FetcherError::Http {
                status: status.as_u16(),
                body,
            });
        }
    }

    /// GET a path and decode the body as JSON
    pub async fn get_json(&self, path: &str, options: &RequestOptions) -> FetcherResult<Value> {
        self.send(path, Method::GET, options)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| FetcherError::Parse(format!("invalid JSON from {path}: {e}")))
    }

    /// GET a path and return the body as text
    pub async fn get_text(&self, path: &str, options: &RequestOptions) -> FetcherResult<String> {
        self.send(path, Method::GET, options)
            .await?
            .text()
            .await
            .map_err(|e| FetcherError::Network(e.to_string()))
    }
}
