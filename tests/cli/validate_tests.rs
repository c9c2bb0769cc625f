//! Tests for the `validate` CLI command
//!
//! - `validate [PATH]` - Validates PATH (or the working directory) and ancestors
//! - `validate -m` - Skips tracked-file checks

use crate::common::{assert_contains, assert_json_type, assert_valid_json, assert_valid_toon, TestRepo};

// ============================================================================
// SUCCESSFUL VALIDATION
// ============================================================================

#[test]
fn test_validate_clean_catalog() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&["validate"]);
    assert_contains(&output, "records_checked: 4");
    assert_contains(&output, "files_checked: 1");
    assert_contains(&output, "status: ok");
}

#[test]
fn test_validate_json_output() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&["validate", "samples", "-f", "json"]);
    let json = assert_valid_json(&output, "validate samples");
    assert_json_type(&json, "validation");
    assert_eq!(json["valid"], true);
    assert_eq!(json["records_in_scope"], 2);
    // Both samples plus the shared project
    assert_eq!(json["records_checked"], 3);
}

#[test]
fn test_validate_toon_output() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&["validate", "-f", "toon"]);
    assert_valid_toon(&output, "validate toon");
}

#[test]
fn test_validate_from_subdirectory() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_in("samples", &["validate", "-f", "json"]).unwrap();
    assert!(output.status.success());
    let json = assert_valid_json(&String::from_utf8_lossy(&output.stdout), "validate in subdir");
    assert_eq!(json["records_in_scope"], 2);
}

#[test]
fn test_validate_unknown_path_is_noop() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();
    repo.add_dir("empty");

    let output = repo.run_cli_success(&["validate", "empty", "-f", "json"]);
    let json = assert_valid_json(&output, "validate empty dir");
    assert_eq!(json["records_checked"], 0);
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_validate_reports_every_problem() {
    let repo = TestRepo::catalog();
    repo.add_record(
        "broken.yaml",
        "sample",
        "broken",
        &["missing.yaml", "{type: project, name: ghost}"],
        "files:\n  - nothing.txt\n",
    );

    let (code, _stdout, stderr) = repo.run_cli_failure(&["validate"]);
    assert_eq!(code, 4);
    assert_contains(&stderr, "3 problem(s)");
    assert_contains(&stderr, "missing.yaml");
    assert_contains(&stderr, "ghost");
    assert_contains(&stderr, "nothing.txt");
}

#[test]
fn test_validate_metadata_only_skips_files() {
    let repo = TestRepo::catalog();
    repo.add_record("a.yaml", "sample", "a", &[], "files:\n  - nothing.txt\n");

    repo.run_cli_failure(&["validate"]);
    let output = repo.run_cli_success(&["validate", "--metadata-only"]);
    assert_contains(&output, "status: ok");
}

#[test]
fn test_validate_reports_load_failures() {
    let repo = TestRepo::catalog();
    repo.add_file("a.yaml", "type: sample\nuid: same\n");
    repo.add_file("b.yaml", "type: sample\nuid: same\n");
    repo.add_file("c.yaml", "name: [unclosed\n");

    let (code, _stdout, stderr) = repo.run_cli_failure(&["validate", "-m"]);
    assert_eq!(code, 4);
    assert_contains(&stderr, "b.yaml");
    assert_contains(&stderr, "c.yaml");
}

#[test]
fn test_validate_untracked_directory() {
    let repo = TestRepo::new();
    repo.add_record("a.yaml", "sample", "a", &[], "");
    if std::env::temp_dir().ancestors().any(|d| d.join("tame.yaml").is_file()) {
        return;
    }

    let (code, _stdout, stderr) = repo.run_cli_failure(&["validate"]);
    assert_eq!(code, 2);
    assert_contains(&stderr, "No root 'tame.yaml' file found");
}
