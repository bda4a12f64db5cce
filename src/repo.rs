//! Repository reference parsing
//!
//! Accepts the usual ways of pointing at a GitHub repository:
//! `https://github.com/owner/repo`, `github.com/owner/repo.git`,
//! `git@github.com:owner/repo.git`, with or without trailing path segments.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static GITHUB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com[/:]([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
        .expect("GitHub URL pattern is a valid regex")
});

/// An `owner/repo` pair on GitHub
///
/// # Examples
///
/// ```
/// use gitspoke::repo::RepoRef;
///
/// let repo = RepoRef::parse("https://github.com/tokio-rs/tokio.git").unwrap();
/// assert_eq!(repo.owner(), "tokio-rs");
/// assert_eq!(repo.name(), "tokio");
/// assert_eq!(repo.api_path(), "repos/tokio-rs/tokio");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    owner: String,
    name: String,
}

impl RepoRef {
    /// Parse a repository URL
    ///
    /// # Errors
    ///
    /// Returns an error if no `github.com/<owner>/<repo>` can be found.
    pub fn parse(url: &str) -> Result<Self, RepoError> {
        let captures = GITHUB_URL
            .captures(url.trim())
            .ok_or_else(|| RepoError::InvalidUrl(url.to_string()))?;

        let owner = captures[1].to_string();
        let name = captures[2]
            .strip_suffix(".git")
            .unwrap_or(&captures[2])
            .to_string();

        Self::new(owner, name).map_err(|_| RepoError::InvalidUrl(url.to_string()))
    }

    /// Build from components
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() || name.is_empty() || owner.starts_with('.') || name.starts_with('.') {
            return Err(RepoError::InvalidUrl(format!("{owner}/{name}")));
        }
        Ok(Self { owner, name })
    }

    /// Repository owner (user or organization)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// REST API path of the repository resource
    pub fn api_path(&self) -> String {
        format!("repos/{}/{}", self.owner, self.name)
    }

    /// HTTPS clone URL under `base` (e.g. `https://github.com`)
    pub fn clone_url(&self, base: &str) -> String {
        format!("{}/{}/{}.git", base.trim_end_matches('/'), self.owner, self.name)
    }

    /// HTTPS clone URL of the wiki repository under `base`
    pub fn wiki_clone_url(&self, base: &str) -> String {
        format!("{}/{}/{}.wiki.git", base.trim_end_matches('/'), self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Errors that can occur while parsing a repository reference
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Not a recognizable GitHub repository URL
    #[error("invalid GitHub URL: {0}")]
    InvalidUrl(String),
}
