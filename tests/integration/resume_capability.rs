//! Integration tests for resuming an archive

use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

use gitspoke::archive::{ItemState, Selection};
use gitspoke::output::ArchiveLayout;
use gitspoke::resume::{ItemStatus, Manifest};

use super::support::{self, StubMirror};

#[tokio::test]
async fn test_second_run_makes_no_requests_and_keeps_manifest_bytes() {
    let server = MockServer::start().await;
    support::mount_repo_info(&server, false).await;
    support::mount_json(&server, "labels", json!([{"name": "bug"}])).await;
    support::mount_json(&server, "languages", json!({"Rust": 1})).await;
    support::mount_status(&server, "pages", 404).await;

    let dir = TempDir::new().unwrap();
    let layout = ArchiveLayout::new(dir.path());
    let selection: Selection = "labels,languages,pages".parse().unwrap();
    let archiver = support::archiver(&server, StubMirror::bundling());

    archiver.archive(&support::repo(), &layout, &selection).await.unwrap();
    let requests_after_first = support::request_count(&server).await;
    let manifest_after_first = std::fs::read(layout.manifest()).unwrap();
    assert_eq!(requests_after_first, 4);

    let report = archiver.archive(&support::repo(), &layout, &selection).await.unwrap();

    assert_eq!(support::request_count(&server).await, requests_after_first);
    assert_eq!(std::fs::read(layout.manifest()).unwrap(), manifest_after_first);
    assert_eq!(report.count("skipped"), 4);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_failed_items_are_retried_on_next_run() {
    let server = MockServer::start().await;
    support::mount_repo_info(&server, false).await;
    support::mount_json(&server, "labels", json!([])).await;
    support::mount_status(&server, "tags", 500).await;

    let dir = TempDir::new().unwrap();
    let layout = ArchiveLayout::new(dir.path());
    let selection: Selection = "labels,tags".parse().unwrap();
    let archiver = support::archiver(&server, StubMirror::bundling());

    let first = archiver.archive(&support::repo(), &layout, &selection).await.unwrap();
    assert_eq!(first.failed(), vec!["tags"]);

    server.reset().await;
    support::mount_json(&server, "tags", json!([{"name": "v1.0.0"}])).await;

    let second = archiver.archive(&support::repo(), &layout, &selection).await.unwrap();

    assert_eq!(second.state("repo_info"), Some(&ItemState::Skipped));
    assert_eq!(second.state("labels"), Some(&ItemState::Skipped));
    assert_eq!(second.state("tags"), Some(&ItemState::Succeeded));
    assert_eq!(support::request_count(&server).await, 1);

    let manifest = Manifest::load(layout.root());
    assert_eq!(manifest.entry("tags").unwrap().status(), ItemStatus::Success);
}

#[tokio::test]
async fn test_existing_artifacts_are_backfilled_without_requests() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let layout = ArchiveLayout::new(dir.path());
    std::fs::write(layout.repo_info(), r#"{"has_wiki": false}"#).unwrap();
    std::fs::write(layout.json_artifact("labels"), "[]").unwrap();

    let archiver = support::archiver(&server, StubMirror::bundling());
    let report = archiver
        .archive(&support::repo(), &layout, &"labels".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(support::request_count(&server).await, 0);
    assert_eq!(report.state("labels"), Some(&ItemState::Skipped));

    let manifest = Manifest::load(layout.root());
    assert_eq!(manifest.entry("repo_info").unwrap().status(), ItemStatus::Success);
    assert_eq!(manifest.entry("labels").unwrap().status(), ItemStatus::Success);
}

#[tokio::test]
async fn test_corrupt_manifest_starts_fresh() {
    let server = MockServer::start().await;
    support::mount_repo_info(&server, false).await;
    support::mount_json(&server, "forks", json!([])).await;

    let dir = TempDir::new().unwrap();
    let layout = ArchiveLayout::new(dir.path());
    std::fs::write(layout.manifest(), "{\"entries\": ").unwrap();

    let archiver = support::archiver(&server, StubMirror::bundling());
    let report = archiver
        .archive(&support::repo(), &layout, &"forks".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(report.state("forks"), Some(&ItemState::Succeeded));
    let manifest = Manifest::load(layout.root());
    assert_eq!(manifest.entries().len(), 2);
}
