//! tame: a metadata catalog over a tree of YAML files
//!
//! Every `.yaml` file below a root `tame.yaml` marker declares one typed
//! record. Records may name parents (by relative path or by a type plus
//! name/uid locator), carry arbitrary user key/values, and list the files
//! they track. This library loads and indexes those records, validates the
//! parent graph and tracked files, and computes the key/values each record
//! inherits from its ancestors, cycles included.
//!
//! # Example
//!
//! ```no_run
//! use tame::{calculate_scc_parent_keyvals, find_root_marker, MetadataCache, Scope};
//!
//! let marker = find_root_marker(None)?;
//! let mut cache = MetadataCache::open(&marker)?;
//! cache.validate(&Scope::Everything, true)?;
//!
//! let keyvals = calculate_scc_parent_keyvals(&mut cache);
//! for handle in cache.handles() {
//!     println!("{}: {} ancestor(s)", cache.relative_path(handle).display(),
//!              keyvals.for_handle(handle).len());
//! }
//! # Ok::<(), tame::TameError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod record;
pub mod resolve;
pub mod scc;
pub mod search;
pub mod validate;
pub mod value;

// Re-export commonly used types
pub use cache::{Handle, LoadFailure, MetadataCache, Scope};
pub use cli::{Cli, Commands, OutputFormat};
pub use commands::encode_toon;
pub use config::{CatalogConfig, RootSettings, ROOT_MARKER};
pub use error::{Result, TameError, ValidationFailure};
pub use fs_utils::find_root_marker;
pub use record::{Locator, ParentRef, Record, RecordIdentity, SourceLocation};
pub use resolve::{resolve_parent, resolve_parents, ParentGraph, UnresolvedParent};
pub use scc::{
    calculate_scc, calculate_scc_parent_keyvals, inherit_keyvals, InheritedKeyvals, InheritedMap,
    SccResult,
};
pub use search::{
    search, search_scoped, AndMatcher, Comparable, KeyValueMatcher, MatchType, Matcher, OrMatcher,
};
pub use validate::{tracked_file_exists, ValidationReport};
pub use value::{UserData, Value};
