//! The resumable archive run
//!
//! An [`Archiver`] resolves the repository snapshot, takes the directory lock,
//! then walks the selected items in a fixed order. Each item is skipped when
//! the manifest (or an artifact already on disk) says it is done; otherwise it
//! is fetched, written atomically and recorded. Item failures are recorded and
//! the run moves on. The manifest is saved once, at the end.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::catalog::{FetchMode, PlannedItem, Selection, REPO_INFO};
use super::mirror::{authenticated_url, MirrorError, MirrorOutcome, MirrorService};
use super::{ArchiveError, ArchiveReport, ItemState};
use crate::fetcher::config::{ACCEPT_HTML, GITHUB_CLONE_URL};
use crate::fetcher::{FetchOutcome, FetcherError, GithubHttpClient, Paginator, RequestOptions};
use crate::metrics;
use crate::output::{self, ArchiveLayout, OutputError};
use crate::repo::RepoRef;
use crate::resume::{ArchiveLock, ItemStatus, Manifest};
use crate::shutdown::{self, SharedShutdown};

/// Failure of a single item; recorded, never fatal to the run
#[derive(Debug, thiserror::Error)]
enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetcherError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

/// Archives one repository at a time into an [`ArchiveLayout`]
pub struct Archiver {
    client: GithubHttpClient,
    paginator: Paginator,
    mirror: Arc<dyn MirrorService>,
    clone_base: String,
    shutdown: Option<SharedShutdown>,
}

impl Archiver {
    /// Create an archiver over a transport and a mirror implementation
    pub fn new(client: GithubHttpClient, mirror: Arc<dyn MirrorService>) -> Self {
        Self {
            paginator: Paginator::new(client.clone()),
            client,
            mirror,
            clone_base: GITHUB_CLONE_URL.to_string(),
            shutdown: shutdown::get_global_shutdown(),
        }
    }

    /// Base URL git remotes are cloned from
    pub fn with_clone_base(mut self, base: impl Into<String>) -> Self {
        self.clone_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Stop starting new items once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.is_shutdown_requested())
    }

    /// Archive `repo` into `layout`, processing only items in `selection`
    ///
    /// # Errors
    ///
    /// Fails before touching the filesystem if the repository cannot be
    /// resolved, and fails if the directory is locked by another run or the
    /// manifest cannot be written. Item failures are not errors; see
    /// [`ArchiveReport::failed`].
    pub async fn archive(
        &self,
        repo: &RepoRef,
        layout: &ArchiveLayout,
        selection: &Selection,
    ) -> Result<ArchiveReport, ArchiveError> {
        let span = info_span!("archive", repo = %repo, dir = %layout.root().display());
        self.run(repo, layout, selection).instrument(span).await
    }

    async fn run(
        &self,
        repo: &RepoRef,
        layout: &ArchiveLayout,
        selection: &Selection,
    ) -> Result<ArchiveReport, ArchiveError> {
        let (repo_info, fetched) = self.resolve_repo_info(repo, layout).await?;

        let mut lock = ArchiveLock::open(&layout.lock())?;
        let _guard = lock.try_exclusive()?;

        let mut manifest = Manifest::load(layout.root());
        let mut report = ArchiveReport::new();

        let info_path = layout.repo_info();
        if fetched {
            output::write_json(&info_path, &repo_info)?;
            manifest.record(REPO_INFO, ItemStatus::Success, None);
            report.push(REPO_INFO, ItemState::Succeeded);
            metrics::record_item(ItemState::Succeeded.label());
        } else {
            manifest.is_done(REPO_INFO, Some(info_path.as_path()));
            report.push(REPO_INFO, ItemState::Skipped);
            metrics::record_item(ItemState::Skipped.label());
        }

        for item in selection.plan() {
            if self.shutdown_requested() {
                warn!(next_item = item.name(), "Shutdown requested, stopping before next item");
                report.mark_interrupted();
                break;
            }

            let span = info_span!("item", item = item.name());
            let state = self
                .process(item, repo, layout, &repo_info, &mut manifest)
                .instrument(span)
                .await;
            metrics::record_item(state.label());
            report.push(item.name(), state);
        }

        manifest.save(layout.root())?;

        info!(
            succeeded = report.count("succeeded"),
            skipped = report.count("skipped"),
            not_found = report.count("not_found"),
            failed = report.count("failed"),
            interrupted = report.was_interrupted(),
            "Archive run finished"
        );
        Ok(report)
    }

    /// Cached snapshot if present, else a fresh fetch; the flag says which
    async fn resolve_repo_info(
        &self,
        repo: &RepoRef,
        layout: &ArchiveLayout,
    ) -> Result<(Value, bool), ArchiveError> {
        let path = layout.repo_info();
        if path.exists() {
            let cached = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
            match cached {
                Ok(info) => {
                    debug!(path = %path.display(), "Using cached repository info");
                    return Ok((info, false));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cached repository info unreadable, refetching");
                }
            }
        }

        info!("Fetching repository info");
        match self
            .client
            .get_json(&repo.api_path(), &RequestOptions::default())
            .await
        {
            Ok(info) => Ok((info, true)),
            Err(e) if e.is_not_found() => Err(ArchiveError::RepoNotFound(repo.to_string())),
            Err(e) => Err(ArchiveError::RepoInfo(e)),
        }
    }

    fn artifact_path(item: PlannedItem, layout: &ArchiveLayout) -> PathBuf {
        match item {
            PlannedItem::Bundle => layout.bundle(),
            PlannedItem::Readme => layout.readme(),
            PlannedItem::Endpoint(endpoint) => layout.json_artifact(endpoint.name),
            PlannedItem::Wiki => layout.wiki_bundle(),
        }
    }

    async fn process(
        &self,
        item: PlannedItem,
        repo: &RepoRef,
        layout: &ArchiveLayout,
        repo_info: &Value,
        manifest: &mut Manifest,
    ) -> ItemState {
        let name = item.name();
        let artifact = Self::artifact_path(item, layout);

        if manifest.is_done(name, Some(artifact.as_path())) {
            debug!("Already archived, skipping");
            return ItemState::Skipped;
        }

        match self.fetch(item, repo, &artifact, repo_info).await {
            Ok(status) => {
                manifest.record(name, status, None);
                match status {
                    ItemStatus::NotFound => {
                        info!("Not found upstream");
                        ItemState::NotFound
                    }
                    _ => {
                        info!(path = %artifact.display(), "Archived");
                        ItemState::Succeeded
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Item failed");
                manifest.record(name, ItemStatus::Error, None);
                ItemState::Failed(e.to_string())
            }
        }
    }

    /// Fetch and write one item, returning the status to record
    async fn fetch(
        &self,
        item: PlannedItem,
        repo: &RepoRef,
        artifact: &Path,
        repo_info: &Value,
    ) -> Result<ItemStatus, ItemError> {
        match item {
            PlannedItem::Endpoint(endpoint) => {
                let path = format!("{}/{}", repo.api_path(), endpoint.api_path);
                match endpoint.fetch_mode {
                    FetchMode::Paginated => {
                        let result = self.paginator.collect(&path, endpoint.list_key).await;
                        match FetchOutcome::from_result(result, endpoint.expect_missing) {
                            FetchOutcome::Success(items) => write_found(artifact, &items),
                            FetchOutcome::NotFound => write_missing(artifact, &json!([])),
                            FetchOutcome::Error(e) => Err(e.into()),
                        }
                    }
                    FetchMode::SingleObject => {
                        let result = self.client.get_json(&path, &RequestOptions::default()).await;
                        match FetchOutcome::from_result(result, endpoint.expect_missing) {
                            FetchOutcome::Success(object) => write_found(artifact, &object),
                            FetchOutcome::NotFound => write_missing(artifact, &json!({})),
                            FetchOutcome::Error(e) => Err(e.into()),
                        }
                    }
                }
            }
            PlannedItem::Readme => {
                let path = format!("{}/readme", repo.api_path());
                let options = RequestOptions::default().with_accept(ACCEPT_HTML);
                let result = self.client.get_text(&path, &options).await;
                match FetchOutcome::from_result(result, true) {
                    FetchOutcome::Success(html) => {
                        output::write_atomic(artifact, html.as_bytes())?;
                        Ok(ItemStatus::Success)
                    }
                    FetchOutcome::NotFound => {
                        output::write_atomic(artifact, b"")?;
                        Ok(ItemStatus::NotFound)
                    }
                    FetchOutcome::Error(e) => Err(e.into()),
                }
            }
            PlannedItem::Bundle => {
                let url = repo.clone_url(&self.clone_base);
                self.mirror_into(&url, artifact).await
            }
            PlannedItem::Wiki => {
                let has_wiki = repo_info
                    .get("has_wiki")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if !has_wiki {
                    debug!("Repository has no wiki");
                    return Ok(ItemStatus::NotFound);
                }
                let url = repo.wiki_clone_url(&self.clone_base);
                self.mirror_into(&url, artifact).await
            }
        }
    }

    async fn mirror_into(&self, url: &str, destination: &Path) -> Result<ItemStatus, ItemError> {
        info!(url, "Mirroring git repository");
        let remote = authenticated_url(url, self.client.config().token.as_deref());
        match self.mirror.create_bundle(&remote, destination).await? {
            MirrorOutcome::Bundled => Ok(ItemStatus::Success),
            MirrorOutcome::RepositoryNotFound | MirrorOutcome::EmptyRepository => Ok(ItemStatus::NotFound),
        }
    }
}

fn write_found(path: &Path, value: &impl serde::Serialize) -> Result<ItemStatus, ItemError> {
    output::write_json(path, value)?;
    Ok(ItemStatus::Success)
}

fn write_missing(path: &Path, placeholder: &Value) -> Result<ItemStatus, ItemError> {
    output::write_json(path, placeholder)?;
    Ok(ItemStatus::NotFound)
}
