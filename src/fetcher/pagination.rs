//! Cursor pagination over GitHub list endpoints
//!
//! GitHub paginates with a `Link` response header whose `rel="next"` entry is
//! the absolute URL of the following page. [`Paginator::paginate`] walks those
//! links and flattens the pages into one lazy stream of JSON items.
//!
//! Some listings refuse to go deeper than a fixed window and answer with a
//! 422 ("pagination is limited for this resource"). That ends the stream with
//! a warning instead of an error, keeping every item already yielded.

use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, LINK};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetcher::config::PER_PAGE;
use crate::fetcher::github_http::{GithubHttpClient, RequestOptions};
use crate::fetcher::{FetcherError, FetcherResult, ItemStream};

/// Safety cap on the number of pages followed in one walk
const MAX_PAGES: usize = 100_000;

/// Extract the `rel="next"` target from a `Link` header value
///
/// ```
/// use gitspoke::fetcher::pagination::parse_next_link;
///
/// let header = r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=5>; rel="last""#;
/// assert_eq!(parse_next_link(header).as_deref(), Some("https://api.github.com/x?page=2"));
/// ```
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(parse_next_link)
}

/// Unwrap a page body into its item array
fn page_items(body: Value, list_key: Option<&str>) -> FetcherResult<Vec<Value>> {
    let items = match list_key {
        Some(key) => match body {
            Value::Object(mut map) => map
                .remove(key)
                .ok_or_else(|| FetcherError::Parse(format!("response has no `{key}` field")))?,
            other => {
                return Err(FetcherError::Parse(format!(
                    "expected an object with `{key}`, got {}",
                    kind(&other)
                )))
            }
        },
        None => body,
    };

    match items {
        Value::Array(items) => Ok(items),
        other => Err(FetcherError::Parse(format!(
            "expected a JSON array of items, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

struct WalkState {
    client: GithubHttpClient,
    next: Option<String>,
    first: bool,
    pages: usize,
    items: usize,
    list_key: Option<String>,
}

/// Link-following paginator
#[derive(Clone)]
pub struct Paginator {
    client: GithubHttpClient,
}

impl Paginator {
    /// Create a paginator over a transport
    pub fn new(client: GithubHttpClient) -> Self {
        Self { client }
    }

    /// Walk every page of `path`, yielding items lazily
    ///
    /// Each call starts a fresh walk. The first request asks for
    /// [`PER_PAGE`] items; later requests use the server's `next` URL as-is.
    /// With `list_key`, items live under that key of each page object.
    pub fn paginate(&self, path: &str, list_key: Option<&str>) -> ItemStream {
        let state = WalkState {
            client: self.client.clone(),
            next: Some(path.to_string()),
            first: true,
            pages: 0,
            items: 0,
            list_key: list_key.map(str::to_string),
        };

        let pages = stream::try_unfold(state, |mut state| async move {
            let Some(url) = state.next.take() else {
                debug!(pages = state.pages, items = state.items, "Pagination complete");
                return Ok(None);
            };

            if state.pages >= MAX_PAGES {
                return Err(FetcherError::Parse(format!(
                    "pagination exceeded {MAX_PAGES} pages at {url}"
                )));
            }

            let options = if state.first {
                RequestOptions::default().with_query("per_page", PER_PAGE)
            } else {
                RequestOptions::default()
            };
            state.first = false;

            let response = match state.client.send(&url, Method::GET, &options).await {
                Ok(response) => response,
                Err(e) if e.is_pagination_limit() => {
                    warn!(
                        url = %url,
                        pages = state.pages,
                        items = state.items,
                        "Pagination limit reached, results truncated"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            state.next = next_link(response.headers());
            let body = response
                .json::<Value>()
                .await
                .map_err(|e| FetcherError::Parse(format!("invalid JSON page from {url}: {e}")))?;
            let items = page_items(body, state.list_key.as_deref())?;

            state.pages += 1;
            state.items += items.len();
            debug!(
                page = state.pages,
                page_items = items.len(),
                has_next = state.next.is_some(),
                "Fetched page"
            );

            Ok(Some((items, state)))
        });

        pages
            .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    /// Walk every page and collect the items
    pub async fn collect(&self, path: &str, list_key: Option<&str>) -> FetcherResult<Vec<Value>> {
        self.paginate(path, list_key).try_collect().await
    }
}
