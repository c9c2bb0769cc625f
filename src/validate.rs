//! Catalog validation: parent resolvability and tracked-file presence
//!
//! Validation starts from every record under a scope and then follows
//! parent edges outward, visiting each record once. Problems are collected
//! and reported together as one `InconsistentMetadata` error.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use serde::Serialize;

use crate::cache::{Handle, MetadataCache, Scope};
use crate::error::{Result, TameError, ValidationFailure};
use crate::resolve::resolve_parents;

/// Summary of a successful validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Records selected by the scope
    pub in_scope: usize,
    /// Records visited, including ancestors outside the scope
    pub visited: usize,
    /// Tracked-file entries checked
    pub files_checked: usize,
}

/// Validate every record under `scope` plus all of their ancestors.
///
/// An unknown scope is a successful no-op. When `check_files` is set,
/// each tracked-file entry must exist exactly or match at least one path
/// as a glob.
///
/// # Errors
///
/// `InconsistentMetadata` carrying every failure found, including sweep
/// load failures that fall under the scope.
pub fn validate(
    cache: &mut MetadataCache,
    scope: &Scope,
    check_files: bool,
) -> Result<ValidationReport> {
    let Some(frontier) = cache.subtree_handles(scope) else {
        tracing::info!("Nothing to validate under {:?}", scope);
        return Ok(ValidationReport::default());
    };

    let mut failures: Vec<ValidationFailure> = Vec::new();
    let mut report = ValidationReport {
        in_scope: frontier.len(),
        ..ValidationReport::default()
    };

    for failure in cache.load_failures() {
        if scope_covers(cache, scope, &failure.path) {
            failures.push(ValidationFailure::LoadFailure {
                file: failure.path.display().to_string(),
                reason: Box::new(clone_error(&failure.error)),
            });
        }
    }

    let mut visited = vec![false; cache.len()];
    let mut queue: VecDeque<Handle> = frontier.into();
    while let Some(handle) = queue.pop_front() {
        if visited.len() < cache.len() {
            visited.resize(cache.len(), false);
        }
        if visited[handle.index()] {
            continue;
        }
        visited[handle.index()] = true;
        report.visited += 1;

        if check_files {
            let record = cache.get(handle);
            let dir = record
                .directory()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cache.root_dir().to_path_buf());
            for entry in &record.tracked_files {
                report.files_checked += 1;
                if !tracked_file_exists(&dir, entry) {
                    failures.push(ValidationFailure::MissingTrackedFile {
                        file: cache.relative_path(handle).display().to_string(),
                        entry: entry.clone(),
                    });
                }
            }
        }

        let (parents, unresolved) = resolve_parents(cache, handle);
        failures.extend(unresolved.into_iter().map(|u| u.into_failure(cache)));
        queue.extend(parents);
    }

    if failures.is_empty() {
        tracing::info!(
            "Validated {} record(s), {} tracked file(s)",
            report.visited,
            report.files_checked
        );
        Ok(report)
    } else {
        for failure in &failures {
            tracing::warn!("{}", failure);
        }
        Err(TameError::InconsistentMetadata { failures })
    }
}

impl MetadataCache {
    /// Validate this catalog; see [`validate`]
    pub fn validate(&mut self, scope: &Scope, check_files: bool) -> Result<ValidationReport> {
        validate(self, scope, check_files)
    }
}

/// Check one tracked-file entry relative to `dir`.
///
/// An exact path wins; otherwise the entry is treated as a glob and must
/// match at least one file or directory.
pub fn tracked_file_exists(dir: &Path, entry: &str) -> bool {
    if dir.join(entry).try_exists().unwrap_or(false) {
        return true;
    }
    glob_has_match(dir, entry)
}

fn glob_has_match(dir: &Path, pattern: &str) -> bool {
    let (prefix, rest) = split_literal_prefix(pattern);
    let base = dir.join(&prefix);
    if rest.is_empty() || !base.is_dir() {
        return false;
    }

    let Some(matcher) = compile_glob(&rest) else {
        tracing::debug!("Invalid glob in tracked files: {}", pattern);
        return false;
    };

    let mut builder = WalkBuilder::new(&base);
    builder.standard_filters(false);
    if !rest.contains("**") {
        builder.max_depth(Some(rest.split('/').count()));
    }

    for entry in builder.build().flatten() {
        let Ok(relative) = entry.path().strip_prefix(&base) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        if matcher.is_match(relative) {
            return true;
        }
    }
    false
}

fn compile_glob(pattern: &str) -> Option<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .ok()
}

/// Split a glob into its leading glob-free directory part and the rest
fn split_literal_prefix(pattern: &str) -> (PathBuf, String) {
    let parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
    let is_magic = |part: &str| part.contains(['*', '?', '[', '{']);

    let literal_len = parts
        .iter()
        .position(|part| is_magic(part))
        .unwrap_or(parts.len());
    let prefix: PathBuf = parts[..literal_len].iter().collect();
    let rest = parts[literal_len..].join("/");
    (prefix, rest)
}

fn scope_covers(cache: &MetadataCache, scope: &Scope, rel: &Path) -> bool {
    let Scope::Path(path) = scope else {
        return true;
    };
    cache
        .relative_key(path)
        .is_some_and(|scoped| rel.starts_with(scoped))
}

/// Re-create a stored load failure for reporting.
///
/// `TameError` owns an `io::Error`, which is not `Clone`.
fn clone_error(error: &TameError) -> TameError {
    match error {
        TameError::MalformedRecord {
            file,
            message,
            line,
            column,
        } => TameError::MalformedRecord {
            file: file.clone(),
            message: message.clone(),
            line: *line,
            column: *column,
        },
        TameError::DuplicateUid {
            record_type,
            uid,
            file,
            existing,
        } => TameError::DuplicateUid {
            record_type: record_type.clone(),
            uid: uid.clone(),
            file: file.clone(),
            existing: existing.clone(),
        },
        TameError::NotFound { what } => TameError::NotFound { what: what.clone() },
        TameError::Io(e) => TameError::Io(io::Error::new(e.kind(), e.to_string())),
        other => TameError::NotFound {
            what: other.to_string(),
        },
    }
}
