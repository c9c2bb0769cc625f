//! Error types and exit codes for tame

use std::fmt;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for tame operations
#[derive(Error, Debug)]
pub enum TameError {
    #[error("Invalid metadata in {file}{}: {message}", format_location(.line, .column))]
    MalformedRecord {
        file: String,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("Metadata with type={record_type}, uid={uid} in {file} does not have a unique type/uid pair (already used by {existing})")]
    DuplicateUid {
        record_type: String,
        uid: String,
        file: String,
        existing: String,
    },

    #[error("No metadata found: {what}")]
    NotFound { what: String },

    #[error("Multiple metadata objects exist with type={record_type}, name={name}: {}", .candidates.join(", "))]
    AmbiguousLocator {
        record_type: String,
        name: String,
        candidates: Vec<String>,
    },

    #[error("Invalid locator: {message}")]
    InvalidLocator { message: String },

    #[error("Inconsistent metadata, {} problem(s) found:\n{}", .failures.len(), format_failures(.failures))]
    InconsistentMetadata { failures: Vec<ValidationFailure> },

    #[error("No root 'tame.yaml' file found from {start}: {reason}")]
    UntrackedRepository { start: String, reason: String },

    #[error("Invalid search query: {message}")]
    InvalidQuery { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One problem found while loading or validating a catalog
#[derive(Debug)]
pub enum ValidationFailure {
    /// A parent reference that could not be resolved to a record
    UnresolvedParent {
        file: String,
        parent: String,
        reason: Box<TameError>,
    },
    /// A tracked file entry with no exact match and no glob match
    MissingTrackedFile { file: String, entry: String },
    /// A file that failed to load during the initial sweep
    LoadFailure { file: String, reason: Box<TameError> },
}

impl ValidationFailure {
    /// The metadata file this failure is attributed to
    pub fn file(&self) -> &str {
        match self {
            Self::UnresolvedParent { file, .. }
            | Self::MissingTrackedFile { file, .. }
            | Self::LoadFailure { file, .. } => file,
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedParent {
                file,
                parent,
                reason,
            } => write!(f, "{}: parent {} could not be resolved: {}", file, parent, reason),
            Self::MissingTrackedFile { file, entry } => {
                write!(f, "{}: tracked file {} does not exist", file, entry)
            }
            Self::LoadFailure { file, reason } => write!(f, "{}: failed to load: {}", file, reason),
        }
    }
}

fn format_location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!(" (line {}, column {})", line, column),
        (Some(line), None) => format!(" (line {})", line),
        _ => String::new(),
    }
}

fn format_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  - {}", failure))
        .collect::<Vec<_>>()
        .join("\n")
}

impl TameError {
    /// Convert error to the process exit code:
    /// - 0: Success
    /// - 1: File not found / IO error
    /// - 2: Not inside a tracked catalog
    /// - 3: Malformed record
    /// - 4: Inconsistent metadata (validation failed)
    /// - 5: Lookup error (duplicate uid, ambiguous or invalid locator)
    /// - 6: Invalid search query
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NotFound { .. } => ExitCode::from(1),
            Self::Io(_) => ExitCode::from(1),
            Self::UntrackedRepository { .. } => ExitCode::from(2),
            Self::MalformedRecord { .. } => ExitCode::from(3),
            Self::InconsistentMetadata { .. } => ExitCode::from(4),
            Self::DuplicateUid { .. } => ExitCode::from(5),
            Self::AmbiguousLocator { .. } => ExitCode::from(5),
            Self::InvalidLocator { .. } => ExitCode::from(5),
            Self::InvalidQuery { .. } => ExitCode::from(6),
        }
    }

    pub(crate) fn malformed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            file: file.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

/// Result type alias for tame operations
pub type Result<T> = std::result::Result<T, TameError>;
