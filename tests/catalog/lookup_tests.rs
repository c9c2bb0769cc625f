//! Identity index behavior through the public API

use tame::{Locator, MetadataCache, Scope, TameError, ROOT_MARKER};

use crate::common::TestRepo;

fn open(repo: &TestRepo) -> MetadataCache {
    MetadataCache::open(&repo.path().join(ROOT_MARKER)).unwrap()
}

#[test]
fn test_sweep_indexes_every_lookup_table() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();
    let mut cache = open(&repo);
    assert_eq!(cache.len(), 4);

    let by_path = cache.lookup_by_path("samples/s1.yaml").unwrap();
    let by_name = cache.lookup_by_locator(&Locator::by_name("sample", "s1")).unwrap();
    assert_eq!(by_path, by_name);

    let project = cache.lookup_by_locator(&Locator::by_uid("project", "P-001")).unwrap();
    assert_eq!(cache.get(project).name, "alpha");
    assert_eq!(cache.len(), 4);
}

#[test]
fn test_lazy_open_loads_on_reference() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();
    let mut cache = MetadataCache::open_lazy(&repo.path().join(ROOT_MARKER)).unwrap();
    assert!(cache.is_empty());

    // Locators only see what has been loaded so far
    assert!(matches!(
        cache.lookup_by_locator(&Locator::by_name("sample", "s1")),
        Err(TameError::NotFound { .. })
    ));
    let s1 = cache.load_or_get("samples/s1.yaml").unwrap();
    assert_eq!(cache.lookup_by_locator(&Locator::by_name("sample", "s1")).unwrap(), s1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_same_name_different_types() {
    let repo = TestRepo::catalog();
    repo.add_record("a.yaml", "sample", "shared", &[], "")
        .add_record("b.yaml", "project", "shared", &[], "")
        .add_record("c.yaml", "sample", "shared", &[], "");
    let cache = open(&repo);

    assert!(cache.lookup_by_locator(&Locator::by_name("project", "shared")).is_ok());
    assert!(matches!(
        cache.lookup_by_locator(&Locator::by_name("sample", "shared")),
        Err(TameError::AmbiguousLocator { .. })
    ));
}

#[test]
fn test_subtree_scope() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();
    let cache = open(&repo);

    assert_eq!(cache.subtree_handles(&Scope::from_path("samples")).unwrap().len(), 2);
    assert_eq!(cache.subtree_handles(&Scope::from_path("runs")).unwrap().len(), 1);
    assert_eq!(cache.subtree_handles(&Scope::from_path(".")).unwrap().len(), 4);
    assert!(cache.subtree_handles(&Scope::from_path("../outside")).is_none());
}

#[test]
fn test_marker_settings_are_read() {
    let repo = TestRepo::new();
    repo.add_file(
        "tame.yaml",
        "catalog:\n  extensions: ['.meta']\nowner: lab-42\n",
    )
    .add_file("a.meta", "type: sample\n")
    .add_file("b.yaml", "type: sample\n");
    let cache = open(&repo);

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.config().extensions, vec![".meta"]);
    assert_eq!(
        cache.settings().extra.get("owner").and_then(|v| v.as_str()),
        Some("lab-42")
    );
}
