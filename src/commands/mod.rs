//! Command modules for the tame CLI
//!
//! Each command module implements a single top-level command:
//! - `validate` - Parent resolution and tracked-file checks
//! - `search` - Key/value search across inherited metadata
//! - `describe` - One record with its parents and inherited data
//! - `graph` - Strongly connected components of the parent graph
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext` for output format and verbosity.

pub mod describe;
pub mod graph;
pub mod search;
pub mod validate;

pub use describe::run_describe;
pub use graph::run_graph;
pub use search::run_search;
pub use validate::run_validate;

use std::path::{Path, PathBuf};

use crate::cache::{MetadataCache, Scope};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::fs_utils::{canonical, find_root_marker};
use crate::scc::InheritedMap;

/// Shared context passed to all command handlers
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Output format (text, toon, or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
}

impl CommandContext {
    /// Create a new CommandContext from CLI args
    pub fn from_cli(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Render a JSON value in the structured formats; `None` for text
    pub fn render_structured(&self, value: &serde_json::Value) -> Option<String> {
        match self.format {
            OutputFormat::Json => Some(format!(
                "{}\n",
                serde_json::to_string_pretty(value).unwrap_or_default()
            )),
            OutputFormat::Toon => Some(format!("{}\n", encode_toon(value))),
            OutputFormat::Text => None,
        }
    }
}

/// Encode a JSON value as proper TOON using the rtoon library
pub fn encode_toon(value: &serde_json::Value) -> String {
    rtoon::encode_default(value).unwrap_or_else(|e| format!("TOON encoding error: {}", e))
}

/// Absolute form of a user-supplied path, relative to the working directory
pub(crate) fn absolute(path: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let joined = match path {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd,
    };
    Ok(canonical(&joined).unwrap_or(joined))
}

/// Find the catalog enclosing `start` and open it with a full sweep
pub(crate) fn open_catalog(start: &Path) -> Result<MetadataCache> {
    let marker = find_root_marker(Some(start))?;
    tracing::debug!("Using catalog root {}", marker.display());
    MetadataCache::open(&marker)
}

/// Scope covering `path`, which must already be absolute
pub(crate) fn scope_for(cache: &MetadataCache, path: &Path) -> Scope {
    match path.strip_prefix(cache.root_dir()) {
        Ok(rel) => Scope::from_path(rel),
        Err(_) => Scope::Path(path.to_path_buf()),
    }
}

/// Inherited map as a JSON list; identities are not valid JSON keys
pub(crate) fn inherited_json(inherited: &InheritedMap) -> serde_json::Value {
    inherited
        .iter()
        .map(|(identity, data)| {
            serde_json::json!({
                "type": identity.record_type,
                "name": identity.name,
                "uid": identity.uid,
                "data": data,
            })
        })
        .collect()
}
