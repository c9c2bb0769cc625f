//! Catalog configuration read from the root `tame.yaml` marker.
//!
//! The marker may be empty. When it carries a top-level `catalog` mapping,
//! that mapping tunes the initial directory sweep:
//!
//! ```yaml
//! catalog:
//!   extensions: [".yaml", ".meta"]
//!   respect_gitignore: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TameError};
use crate::record::{decode_yaml, read_source, SourceLocation};
use crate::value::{key_text, UserData, Value};

/// File name of the marker that delimits one catalog
pub const ROOT_MARKER: &str = "tame.yaml";

/// Sweep configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// File extensions (with leading dot) loaded by the sweep
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Skip files excluded by .gitignore / .ignore
    #[serde(default)]
    pub respect_gitignore: bool,

    /// Skip dotfiles and dot-directories
    #[serde(default)]
    pub skip_hidden: bool,

    #[serde(default)]
    pub follow_links: bool,
}

fn default_extensions() -> Vec<String> {
    vec![".yaml".to_string()]
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            respect_gitignore: false,
            skip_hidden: false,
            follow_links: false,
        }
    }
}

impl CatalogConfig {
    /// True if `path` carries one of the configured extensions
    pub fn matches_extension(&self, path: &Path) -> bool {
        let file_name = path.file_name().map(|n| n.to_string_lossy());
        match file_name {
            Some(name) => self.extensions.iter().any(|ext| name.ends_with(ext.as_str())),
            None => false,
        }
    }
}

/// Parsed contents of the root marker
#[derive(Debug, Clone, Default)]
pub struct RootSettings {
    pub catalog: CatalogConfig,
    /// Every other top-level key of the marker, kept opaque
    pub extra: UserData,
}

impl RootSettings {
    /// Load settings from the marker file at `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let location = SourceLocation::File(path.to_path_buf());
        let content = read_source(&location)?;
        Self::parse(&content, &location)
    }

    /// Invalid YAML and a malformed `catalog` section are errors. A marker
    /// that is not a mapping carries no settings.
    pub fn parse(content: &str, source: &SourceLocation) -> Result<Self> {
        let mapping = match decode_yaml(content, source)? {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Null => return Ok(Self::default()),
            _ => {
                tracing::debug!("Root marker {} is not a mapping, using defaults", source);
                return Ok(Self::default());
            }
        };

        let mut settings = Self::default();
        for (key, value) in mapping {
            let key = key_text(key);
            if key == "catalog" {
                settings.catalog = serde_yaml::from_value(value).map_err(|e| {
                    TameError::malformed(source.display_name(), format!("invalid catalog settings: {}", e))
                })?;
            } else {
                settings.extra.insert(key, Value::from(value));
            }
        }
        Ok(settings)
    }
}
