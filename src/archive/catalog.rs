//! The fixed catalog of archive items and the inclusion selector
//!
//! Catalog entries are JSON endpoints relative to the repository resource.
//! Four more items live outside the catalog because they are fetched
//! differently: the repository snapshot, the rendered readme, and the two
//! git mirrors.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Repository snapshot; always resolved first
pub const REPO_INFO: &str = "repo_info";
/// Full-history git bundle
pub const BUNDLE: &str = "bundle";
/// Rendered readme
pub const README: &str = "readme";
/// Wiki git bundle
pub const WIKI: &str = "wiki";
/// Selector token meaning every item
pub const ALL: &str = "all";

/// How an endpoint returns its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// A list walked page by page
    Paginated,
    /// A single JSON object
    SingleObject,
}

/// One JSON endpoint to archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveItem {
    /// Manifest key and file stem
    pub name: &'static str,
    /// Path relative to `repos/<owner>/<repo>/`
    pub api_path: &'static str,
    /// Pagination behaviour
    pub fetch_mode: FetchMode,
    /// A 404 means "absent", not failure
    pub expect_missing: bool,
    /// Key holding the item array in each page object
    pub list_key: Option<&'static str>,
}

impl ArchiveItem {
    const fn paginated(name: &'static str, api_path: &'static str) -> Self {
        Self {
            name,
            api_path,
            fetch_mode: FetchMode::Paginated,
            expect_missing: false,
            list_key: None,
        }
    }

    const fn single(name: &'static str, api_path: &'static str, expect_missing: bool) -> Self {
        Self {
            name,
            api_path,
            fetch_mode: FetchMode::SingleObject,
            expect_missing,
            list_key: None,
        }
    }

    const fn with_list_key(mut self, key: &'static str) -> Self {
        self.list_key = Some(key);
        self
    }
}

/// JSON endpoints, in processing order
pub const CATALOG: &[ArchiveItem] = &[
    ArchiveItem::paginated("issues", "issues?state=all"),
    ArchiveItem::paginated("issue_comments", "issues/comments"),
    ArchiveItem::paginated("labels", "labels"),
    ArchiveItem::paginated("milestones", "milestones?state=all"),
    ArchiveItem::paginated("pull_requests", "pulls?state=all"),
    ArchiveItem::paginated("pr_review_comments", "pulls/comments"),
    ArchiveItem::paginated("releases", "releases"),
    ArchiveItem::paginated("tags", "tags"),
    ArchiveItem::paginated("security_advisories", "security-advisories"),
    ArchiveItem::paginated("workflows", "actions/workflows").with_list_key("workflows"),
    ArchiveItem::paginated("stargazers", "stargazers"),
    ArchiveItem::paginated("watchers", "subscribers"),
    ArchiveItem::paginated("contributors", "contributors"),
    ArchiveItem::paginated("commit_comments", "comments"),
    ArchiveItem::paginated("forks", "forks"),
    ArchiveItem::paginated("branches", "branches"),
    ArchiveItem::single("pages", "pages", true),
    ArchiveItem::single("languages", "languages", false),
];

/// Look up a catalog entry by name
pub fn find(name: &str) -> Option<&'static ArchiveItem> {
    CATALOG.iter().find(|item| item.name == name)
}

/// Everything that can follow the repository snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedItem {
    /// Full-history mirror
    Bundle,
    /// Rendered readme
    Readme,
    /// A JSON endpoint
    Endpoint(&'static ArchiveItem),
    /// Wiki mirror
    Wiki,
}

impl PlannedItem {
    /// Manifest key
    pub fn name(&self) -> &'static str {
        match self {
            PlannedItem::Bundle => BUNDLE,
            PlannedItem::Readme => README,
            PlannedItem::Endpoint(item) => item.name,
            PlannedItem::Wiki => WIKI,
        }
    }

    /// All items in processing order
    pub fn all() -> impl Iterator<Item = PlannedItem> {
        std::iter::once(PlannedItem::Bundle)
            .chain(std::iter::once(PlannedItem::Readme))
            .chain(CATALOG.iter().map(PlannedItem::Endpoint))
            .chain(std::iter::once(PlannedItem::Wiki))
    }
}

/// Whether `token` names something selectable
fn is_known(token: &str) -> bool {
    matches!(token, ALL | REPO_INFO | BUNDLE | README | WIKI) || find(token).is_some()
}

/// Selector parse errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Nothing was selected
    #[error("no items selected")]
    Empty,

    /// One or more tokens are not archive items
    #[error("unknown item(s): {}. Valid items: {}", .0.join(", "), valid_tokens().join(", "))]
    Unknown(Vec<String>),
}

/// Every accepted selector token
pub fn valid_tokens() -> Vec<&'static str> {
    let mut tokens = vec![ALL, REPO_INFO];
    tokens.extend(PlannedItem::all().map(|item| item.name()));
    tokens
}

/// Inclusion set over item names
///
/// Parsed from a comma-separated, case-insensitive list; `all` selects
/// everything.
///
/// ```
/// use gitspoke::archive::catalog::Selection;
///
/// let selection: Selection = "Labels, languages".parse().unwrap();
/// assert!(selection.includes("labels"));
/// assert!(!selection.includes("issues"));
/// assert!("labels,nope".parse::<Selection>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    names: BTreeSet<String>,
}

impl Selection {
    /// Select every item
    pub fn all() -> Self {
        Self {
            names: BTreeSet::from([ALL.to_string()]),
        }
    }

    /// Whether `name` is selected
    pub fn includes(&self, name: &str) -> bool {
        self.names.contains(ALL) || self.names.contains(name)
    }

    /// Selected items (excluding the snapshot) in processing order
    pub fn plan(&self) -> Vec<PlannedItem> {
        PlannedItem::all()
            .filter(|item| self.includes(item.name()))
            .collect()
    }
}

impl FromStr for Selection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let names: BTreeSet<String> = s
            .split(',')
            .map(|token| token.trim().to_lowercase())
            .filter(|token| !token.is_empty())
            .collect();

        if names.is_empty() {
            return Err(SelectionError::Empty);
        }

        let unknown: Vec<String> = names.iter().filter(|n| !is_known(n)).cloned().collect();
        if !unknown.is_empty() {
            return Err(SelectionError::Unknown(unknown));
        }

        Ok(Self { names })
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}
