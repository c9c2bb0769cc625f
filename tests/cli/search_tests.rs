//! Tests for the `search` CLI command

use crate::common::{assert_contains, assert_json_type, assert_valid_json, result_paths, TestRepo};

#[test]
fn test_search_by_key_includes_inherited() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&["search", "lead=ada", "-f", "json"]);
    let json = assert_valid_json(&output, "search lead");
    assert_json_type(&json, "search_results");
    // The project itself, both samples and the run below s1
    assert_eq!(
        result_paths(&json),
        vec![
            "projects/alpha.yaml",
            "runs/r1/run.yaml",
            "samples/s1.yaml",
            "samples/s2.yaml"
        ]
    );
}

#[test]
fn test_search_no_parents() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&["search", "lead=ada", "--no-parents", "-f", "json"]);
    let json = assert_valid_json(&output, "search own fields");
    assert_eq!(result_paths(&json), vec!["projects/alpha.yaml"]);
}

#[test]
fn test_search_numeric_ordering() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&[
        "search",
        "temperature=10",
        "--op",
        "gt",
        "--no-parents",
        "-f",
        "json",
    ]);
    let json = assert_valid_json(&output, "search temperature");
    assert_eq!(result_paths(&json), vec!["samples/s1.yaml"]);
}

#[test]
fn test_search_terms_and_or() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let both = repo.run_cli_success(&["search", "type=sample", "tags=green", "-f", "json"]);
    let json = assert_valid_json(&both, "and");
    assert_eq!(result_paths(&json), vec!["samples/s1.yaml"]);

    let either = repo.run_cli_success(&[
        "search",
        "name=s2",
        "name=alpha",
        "--any",
        "--no-parents",
        "-f",
        "json",
    ]);
    let json = assert_valid_json(&either, "or");
    assert_eq!(result_paths(&json), vec!["projects/alpha.yaml", "samples/s2.yaml"]);
}

#[test]
fn test_search_scoped_to_path() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&["search", "lead=ada", "--path", "samples", "-f", "json"]);
    let json = assert_valid_json(&output, "scoped");
    assert_eq!(result_paths(&json), vec!["samples/s1.yaml", "samples/s2.yaml"]);
}

#[test]
fn test_search_text_output() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let output = repo.run_cli_success(&["search", "type=run"]);
    assert_contains(&output, "runs/r1/run.yaml  (run r1)");

    let none = repo.run_cli_success(&["search", "type=nothing-like-this"]);
    assert_contains(&none, "No matching metadata found.");
}

#[test]
fn test_search_invalid_query() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();

    let (code, _stdout, stderr) = repo.run_cli_failure(&["search", "temperature=warm", "--op", "lt"]);
    assert_eq!(code, 6);
    assert_contains(&stderr, "Invalid search query");
}
