use std::path::{Path, PathBuf};
use gitspoke::archive::catalog::{PlannedItem, CATALOG};
use gitspoke::output::{self, ArchiveLayout};
use gitspoke::repo::RepoRef;
use tempfile::TempDir;

#[test]
fn test_default_layout_is_owner_then_repo() {
    let repo = RepoRef::parse("git@github.com:rust-lang/rust.git").unwrap();
    let layout = ArchiveLayout::for_repo(Path::new("archives"), &repo);
    assert_eq!(layout.root(), Path::new("archives/rust-lang/rust"));
    assert_eq!(layout.manifest(), PathBuf::from("archives/rust-lang/rust/manifest.json"));
}

#[test]
fn test_every_item_has_a_distinct_artifact() {
    let layout = ArchiveLayout::new("a");
    let mut paths: Vec<PathBuf> = CATALOG
        .iter()
        .map(|item| layout.json_artifact(item.name))
        .collect();
    paths.extend([layout.repo_info(), layout.readme(), layout.bundle(), layout.wiki_bundle()]);

    let total = paths.len();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), total);
    assert_eq!(total, PlannedItem::all().count() + 1);
    assert!(!paths.contains(&layout.manifest()));
    assert!(!paths.contains(&layout.lock()));
}

#[test]
fn test_write_json_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let layout = ArchiveLayout::new(dir.path().join("nested"));

    output::write_json(&layout.json_artifact("labels"), &serde_json::json!([1, 2])).unwrap();
    output::write_json(&layout.json_artifact("labels"), &serde_json::json!([3])).unwrap();

    let names: Vec<String> = std::fs::read_dir(layout.root())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["labels.json".to_string()]);
    let text = std::fs::read_to_string(layout.json_artifact("labels")).unwrap();
    assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap(), serde_json::json!([3]));
}
