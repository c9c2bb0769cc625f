//! Filesystem helpers: root discovery, the catalog sweep and path normalization
//!
//! - `normalize_path`: Strips Windows `\\?\` prefix from canonicalized paths
//! - `find_root_marker`: Walks upward to the directory holding `tame.yaml`
//! - `walk_catalog`: Lists every candidate metadata file under a root
//! - `simplify_filename`: Renders a path relative to the working directory

use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::config::{CatalogConfig, ROOT_MARKER};
use crate::error::{Result, TameError};
use crate::record::INLINE_SOURCE;

/// Normalize Windows paths by removing the `\\?\` prefix if present.
///
/// `Path::canonicalize()` returns extended-length paths on Windows, which
/// break prefix stripping against the catalog root. No-op on Unix.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use tame::fs_utils::normalize_path;
///
/// let path = PathBuf::from("/home/user/catalog");
/// assert_eq!(normalize_path(&path), path);
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let s = path.to_string_lossy();
        if let Some(stripped) = s.strip_prefix(r"\\?\UNC\") {
            return PathBuf::from(format!(r"\\{}", stripped));
        }
        if let Some(stripped) = s.strip_prefix(r"\\?\") {
            return PathBuf::from(stripped);
        }
    }
    path.to_path_buf()
}

/// Canonicalize and normalize in one step
pub fn canonical(path: &Path) -> io::Result<PathBuf> {
    path.canonicalize().map(|p| normalize_path(&p))
}

/// Starting from `start` (or the current directory), walk up until a
/// directory containing `tame.yaml` is found and return the marker's path.
///
/// # Errors
///
/// `UntrackedRepository` if the filesystem root is reached, or if a
/// permission error interrupts the search.
pub fn find_root_marker(start: Option<&Path>) -> Result<PathBuf> {
    let start = match start {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let untracked = |reason: String| TameError::UntrackedRepository {
        start: start.display().to_string(),
        reason,
    };

    let first_dir = if start.is_dir() {
        start.clone()
    } else {
        start.parent().map(Path::to_path_buf).unwrap_or_default()
    };
    let first_dir = if first_dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        first_dir
    };

    let mut current = canonical(&first_dir).map_err(|e| untracked(e.to_string()))?;
    loop {
        let candidate = current.join(ROOT_MARKER);
        match candidate.try_exists() {
            Ok(true) if candidate.is_file() => return Ok(candidate),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(untracked(format!("permission denied: {}", e)));
            }
            Err(_) => {}
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Err(untracked("reached filesystem root".to_string())),
        }
    }
}

/// Walk `root` and return every file whose name ends in a configured
/// extension, sorted.
pub fn walk_catalog(root: &Path, config: &CatalogConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(TameError::NotFound {
            what: format!("catalog directory {}", root.display()),
        });
    }

    let mut builder = WalkBuilder::new(root);
    builder.git_ignore(config.respect_gitignore);
    builder.git_global(config.respect_gitignore);
    builder.git_exclude(config.respect_gitignore);
    builder.ignore(config.respect_gitignore);
    builder.parents(config.respect_gitignore);
    builder.require_git(false);
    builder.hidden(config.skip_hidden);
    builder.follow_links(config.follow_links);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable catalog entry: {}", e);
                continue;
            }
        };
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && config.matches_extension(entry.path()) {
            files.push(normalize_path(entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Render `filename` relative to the current directory when it lies below it.
///
/// `None` renders as the inline-source sentinel.
pub fn simplify_filename(filename: Option<&Path>) -> String {
    let Some(filename) = filename else {
        return INLINE_SOURCE.to_string();
    };
    let cwd = std::env::current_dir().ok();
    cwd.as_deref()
        .and_then(|cwd| filename.strip_prefix(cwd).ok())
        .unwrap_or(filename)
        .display()
        .to_string()
}
