//! Archive manifest: per-item completion state
//!
//! The manifest is the source of truth for "is this item already done". It
//! is loaded once at the start of a run, mutated as items finish, and saved
//! once at the end. `success` and `not found` are terminal; `error` entries
//! are retried by the next run.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::fetcher::config::user_agent;
use crate::output::{self, path::MANIFEST_FILE};

/// Manifests larger than this are treated as corrupt rather than read
pub const MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024;

/// Final status of an archive item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Artifact written and authoritative
    #[serde(rename = "success")]
    Success,
    /// Resource does not exist upstream; placeholder written where applicable
    #[serde(rename = "not found")]
    NotFound,
    /// Last attempt failed; retried next run
    #[serde(rename = "error")]
    Error,
}

impl ItemStatus {
    /// Whether this status ends processing of the item for good
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Error)
    }
}

/// One manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    timestamp: String,
    status: ItemStatus,
}

impl ManifestEntry {
    /// RFC3339 time the status was recorded
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Recorded status
    pub fn status(&self) -> ItemStatus {
        self.status
    }
}

/// Errors saving a manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Write failure
    #[error("failed to write manifest: {0}")]
    Write(#[from] output::OutputError),
}

/// Per-directory record of archive progress
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    #[serde(default)]
    entries: BTreeMap<String, ManifestEntry>,
    #[serde(skip)]
    dirty: bool,
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Manifest {
    /// Empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifest of an archive directory
    ///
    /// A missing, oversized or malformed file yields an empty manifest: prior
    /// resume state is dropped, but the run proceeds.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "No manifest found, starting fresh");
            return Self::new();
        }

        match std::fs::metadata(&path) {
            Ok(meta) if meta.len() > MAX_MANIFEST_SIZE => {
                warn!(
                    path = %path.display(),
                    size = meta.len(),
                    max = MAX_MANIFEST_SIZE,
                    "Manifest too large, starting fresh"
                );
                return Self::new();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot stat manifest, starting fresh");
                return Self::new();
            }
        }

        let manifest = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Manifest>(&text).map_err(|e| e.to_string()));

        match manifest {
            Ok(manifest) => {
                info!(
                    path = %path.display(),
                    entries = manifest.entries.len(),
                    "Loaded manifest"
                );
                manifest
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Manifest unreadable, starting fresh");
                Self::new()
            }
        }
    }

    /// Tool identifier stamped by the last save that changed anything
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// All entries, sorted by item name
    pub fn entries(&self) -> &BTreeMap<String, ManifestEntry> {
        &self.entries
    }

    /// Entry for one item
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(name)
    }

    /// Whether anything was recorded since load
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record an item's status; `timestamp` defaults to now
    pub fn record(&mut self, name: &str, status: ItemStatus, timestamp: Option<DateTime<Utc>>) {
        let entry = ManifestEntry {
            timestamp: format_timestamp(timestamp.unwrap_or_else(Utc::now)),
            status,
        };
        debug!(item = name, status = ?status, "Recording manifest entry");
        self.entries.insert(name.to_string(), entry);
        self.dirty = true;
    }

    /// Whether `name` needs no further work
    ///
    /// True when the entry is terminal, or when `fallback` already exists on
    /// disk. The latter covers archives written before manifests existed: the
    /// entry is backfilled as a success stamped with the file's mtime.
    pub fn is_done(&mut self, name: &str, fallback: Option<&Path>) -> bool {
        if let Some(entry) = self.entries.get(name) {
            if entry.status.is_terminal() {
                return true;
            }
        }

        let Some(path) = fallback else {
            return false;
        };
        if !path.exists() {
            return false;
        }

        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .ok();
        info!(item = name, path = %path.display(), "Artifact already on disk, backfilling manifest");
        self.record(name, ItemStatus::Success, mtime);
        true
    }

    /// Write the manifest into `dir`
    ///
    /// The tool identifier is refreshed only when something changed since
    /// load (or none was recorded), so an idle re-run rewrites the same bytes.
    pub fn save(&mut self, dir: &Path) -> Result<(), ManifestError> {
        if self.dirty || self.user_agent.is_none() {
            self.user_agent = Some(user_agent());
        }

        let path = dir.join(MANIFEST_FILE);
        output::write_json(&path, self)?;
        self.dirty = false;

        info!(path = %path.display(), entries = self.entries.len(), "Manifest saved");
        Ok(())
    }
}
