//! CLI command integration tests
//!
//! Each module drives the `tame` binary against a scratch catalog and
//! checks text, TOON and JSON output plus exit codes.

pub mod search_tests;
pub mod validate_tests;
