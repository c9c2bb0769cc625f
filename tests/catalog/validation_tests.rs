//! Validation scenarios through the public API

use tame::{MetadataCache, Scope, TameError, ValidationFailure, ROOT_MARKER};

use crate::common::TestRepo;

fn open(repo: &TestRepo) -> MetadataCache {
    MetadataCache::open(&repo.path().join(ROOT_MARKER)).unwrap()
}

fn failures(result: tame::Result<tame::ValidationReport>) -> Vec<ValidationFailure> {
    match result {
        Err(TameError::InconsistentMetadata { failures }) => failures,
        other => panic!("expected inconsistent metadata, got {:?}", other),
    }
}

#[test]
fn test_lab_catalog_is_valid() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();
    let mut cache = open(&repo);
    let report = cache.validate(&Scope::Everything, true).unwrap();
    assert_eq!(report.visited, 4);
    assert_eq!(report.files_checked, 1);
}

#[test]
fn test_removed_tracked_file_is_reported() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();
    std::fs::remove_file(repo.path().join("runs/r1/data/reads.csv")).unwrap();
    let mut cache = open(&repo);

    let found = failures(cache.validate(&Scope::from_path("runs"), true));
    assert_eq!(found.len(), 1);
    match &found[0] {
        ValidationFailure::MissingTrackedFile { file, entry } => {
            assert_eq!(file, "runs/r1/run.yaml");
            assert_eq!(entry, "data/*.csv");
        }
        other => panic!("unexpected failure {:?}", other),
    }

    // Samples do not reach the run, so they stay valid
    cache.validate(&Scope::from_path("samples"), true).unwrap();
}

#[test]
fn test_cyclic_catalog_validates() {
    let repo = TestRepo::catalog();
    repo.add_record("a.yaml", "node", "a", &["b.yaml"], "")
        .add_record("b.yaml", "node", "b", &["{type: node, name: c}"], "")
        .add_record("c.yaml", "node", "c", &["a.yaml", "c.yaml"], "");
    let mut cache = open(&repo);
    let report = cache.validate(&Scope::from_path("a.yaml"), true).unwrap();
    assert_eq!(report.in_scope, 1);
    assert_eq!(report.visited, 3);
}

#[test]
fn test_failures_attributed_to_referring_file() {
    let repo = TestRepo::catalog();
    repo.add_record("nested/child.yaml", "sample", "child", &["../nope.yaml"], "");
    let mut cache = open(&repo);

    let found = failures(cache.validate(&Scope::Everything, false));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].file(), "nested/child.yaml");
    let message = found[0].to_string();
    assert!(message.contains("../nope.yaml"), "{}", message);
}

#[test]
fn test_validation_never_removes_records() {
    let repo = TestRepo::catalog();
    repo.add_record("a.yaml", "sample", "a", &["ghost.yaml"], "");
    let mut cache = open(&repo);
    assert!(cache.validate(&Scope::Everything, true).is_err());
    assert_eq!(cache.len(), 1);
    assert!(cache.handle_for_path("a.yaml").is_some());
}
