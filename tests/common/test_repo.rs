//! TestRepo builder for scratch catalogs
//!
//! Each repo is a temporary directory. `new()` leaves it untracked;
//! `catalog()` adds the root `tame.yaml` marker.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Builder for temporary catalog directories
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new empty directory with no root marker
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Create a directory with an empty root marker
    pub fn catalog() -> Self {
        let repo = Self::new();
        repo.add_file("tame.yaml", "\n");
        repo
    }

    /// Get the path to the test repository root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a file with the given content
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    /// Add a metadata record with optional parents and extra YAML lines
    pub fn add_record(
        &self,
        relative_path: &str,
        record_type: &str,
        name: &str,
        parents: &[&str],
        extra: &str,
    ) -> &Self {
        let mut content = format!("type: {}\nname: {}\n", record_type, name);
        if !parents.is_empty() {
            content.push_str("parent:\n");
            for parent in parents {
                content.push_str(&format!("  - {}\n", parent));
            }
        }
        content.push_str(extra);
        self.add_file(relative_path, &content)
    }

    /// Create an empty directory
    pub fn add_dir(&self, relative_path: &str) -> &Self {
        fs::create_dir_all(self.dir.path().join(relative_path)).expect("Failed to create dir");
        self
    }

    /// Run the tame binary from the repository root
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        self.run_cli_in(".", args)
    }

    /// Run the tame binary from a subdirectory of the repository
    pub fn run_cli_in(&self, subdir: &str, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_tame"))
            .current_dir(self.path().join(subdir))
            .env_remove("RUST_LOG")
            .args(args)
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (exit code, stdout, stderr)
    pub fn run_cli_failure(&self, args: &[&str]) -> (i32, String, String) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }

    // ========================================================================
    // PRE-BUILT CATALOGS
    // ========================================================================

    /// A small lab catalog: one project, two samples, one run tracking data
    pub fn with_lab_layout(&self) -> &Self {
        self.add_record(
            "projects/alpha.yaml",
            "project",
            "alpha",
            &[],
            "uid: P-001\nlead: ada\nstarted: 2020-03-01\n",
        )
        .add_record(
            "samples/s1.yaml",
            "sample",
            "s1",
            &["../projects/alpha.yaml"],
            "temperature: 37\ntags: [blue, green]\n",
        )
        .add_record(
            "samples/s2.yaml",
            "sample",
            "s2",
            &["{type: project, uid: P-001}"],
            "temperature: 4\n",
        )
        .add_record(
            "runs/r1/run.yaml",
            "run",
            "r1",
            &["{type: sample, name: s1}"],
            "files:\n  - data/*.csv\n",
        )
        .add_file("runs/r1/data/reads.csv", "a,b\n1,2\n")
    }
}
