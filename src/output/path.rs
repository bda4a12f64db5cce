//! Archive directory layout
//!
//! One directory per repository, holding:
//!
//! ```text
//! <owner>/<repo>/
//!   manifest.json      completion state per item
//!   manifest.lock      advisory lock held by a running archive
//!   repo_info.json     repository snapshot
//!   readme.html        rendered readme
//!   <item>.json        one file per catalog item
//!   git.bundle         full-history mirror
//!   wiki.bundle        wiki mirror
//! ```

use std::path::{Path, PathBuf};

use crate::repo::RepoRef;

/// Manifest file name
pub const MANIFEST_FILE: &str = "manifest.json";

/// Lock file name
pub const LOCK_FILE: &str = "manifest.lock";

/// Paths of every artifact inside one archive directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    /// Layout rooted at an explicit directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default layout: `<base>/<owner>/<repo>`
    pub fn for_repo(base: &Path, repo: &RepoRef) -> Self {
        Self::new(base.join(repo.owner()).join(repo.name()))
    }

    /// Archive directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Manifest path
    pub fn manifest(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Lock file path
    pub fn lock(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Repository snapshot path
    pub fn repo_info(&self) -> PathBuf {
        self.json_artifact("repo_info")
    }

    /// Rendered readme path
    pub fn readme(&self) -> PathBuf {
        self.root.join("readme.html")
    }

    /// Main history bundle path
    pub fn bundle(&self) -> PathBuf {
        self.root.join("git.bundle")
    }

    /// Wiki bundle path
    pub fn wiki_bundle(&self) -> PathBuf {
        self.root.join("wiki.bundle")
    }

    /// `<name>.json` inside the archive directory
    pub fn json_artifact(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}
