//! GitMirror against real local repositories over file:// URLs

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

use gitspoke::archive::{Archiver, GitMirror, ItemState, MirrorOutcome, MirrorService};
use gitspoke::output::ArchiveLayout;
use gitspoke::resume::{ItemStatus, Manifest};

use super::support;

fn git(cwd: &Path, args: &[&str]) {
    let status = Command::new("git")
        .current_dir(cwd)
        .args(["-c", "user.name=gitspoke", "-c", "user.email=gitspoke@example.test"])
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn bare_repo(path: &Path) -> PathBuf {
    std::fs::create_dir_all(path).unwrap();
    git(path, &["init", "--bare", "--quiet"]);
    path.to_path_buf()
}

/// A bare repository holding a single empty commit on `main`
fn populated_repo(root: &Path, bare: &Path) -> PathBuf {
    let bare = bare_repo(bare);
    let work = root.join("work");
    std::fs::create_dir_all(&work).unwrap();
    git(&work, &["init", "--quiet"]);
    git(&work, &["commit", "--allow-empty", "--quiet", "-m", "initial"]);
    git(&work, &["push", "--quiet", bare.to_str().unwrap(), "HEAD:refs/heads/main"]);
    bare
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_populated_repository_is_bundled_in_place() {
    let remotes = TempDir::new().unwrap();
    let bare = populated_repo(remotes.path(), &remotes.path().join("origin.git"));

    let out = TempDir::new().unwrap();
    let destination = out.path().join("git.bundle");
    let outcome = GitMirror::new()
        .create_bundle(&file_url(&bare), &destination)
        .await
        .unwrap();

    assert_eq!(outcome, MirrorOutcome::Bundled);
    assert!(std::fs::metadata(&destination).unwrap().len() > 0);
    // scratch directory is gone, only the bundle remains
    assert_eq!(entries(out.path()), vec!["git.bundle".to_string()]);

    let verify = Command::new("git")
        .args(["bundle", "verify"])
        .arg(&destination)
        .current_dir(&bare)
        .output()
        .unwrap();
    assert!(verify.status.success(), "{}", String::from_utf8_lossy(&verify.stderr));
}

#[tokio::test]
async fn test_empty_repository_leaves_no_bundle() {
    let remotes = TempDir::new().unwrap();
    let bare = bare_repo(&remotes.path().join("empty.git"));

    let out = TempDir::new().unwrap();
    let destination = out.path().join("git.bundle");
    let outcome = GitMirror::new()
        .create_bundle(&file_url(&bare), &destination)
        .await
        .unwrap();

    assert_eq!(outcome, MirrorOutcome::EmptyRepository);
    assert!(!destination.exists());
    assert!(entries(out.path()).is_empty());
}

#[tokio::test]
async fn test_unreadable_remote_is_an_error_and_leaves_nothing() {
    let remotes = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let destination = out.path().join("git.bundle");

    let result = GitMirror::new()
        .create_bundle(&file_url(&remotes.path().join("absent.git")), &destination)
        .await;

    assert!(result.is_err(), "{result:?}");
    assert!(entries(out.path()).is_empty());
}

#[tokio::test]
async fn test_archive_run_writes_real_bundle() {
    let server = MockServer::start().await;
    support::mount_repo_info(&server, false).await;

    let remotes = TempDir::new().unwrap();
    let owner_dir = remotes.path().join(support::OWNER);
    populated_repo(remotes.path(), &owner_dir.join(format!("{}.git", support::NAME)));

    let dir = TempDir::new().unwrap();
    let layout = ArchiveLayout::new(dir.path());
    let archiver = Archiver::new(support::client(&server), Arc::new(GitMirror::new()))
        .with_clone_base(file_url(remotes.path()));

    let report = archiver
        .archive(&support::repo(), &layout, &"bundle".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(report.state("bundle"), Some(&ItemState::Succeeded));
    assert!(layout.bundle().exists());
    assert!(!entries(layout.root()).iter().any(|name| name.starts_with(".mirror-")));
    let manifest = Manifest::load(layout.root());
    assert_eq!(manifest.entry("bundle").unwrap().status(), ItemStatus::Success);
}
