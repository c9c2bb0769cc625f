//! Metadata records parsed from YAML documents
//!
//! A record is one YAML mapping with a required `type` key. The keys
//! `name`, `uid`, `parent` and `files` are reserved; everything else is
//! kept verbatim as user data.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, TameError};
use crate::fs_utils::simplify_filename;
use crate::value::{key_text, UserData, Value};

/// Keys with special meaning that never appear in user data
pub const RESERVED_KEYS: [&str; 5] = ["type", "name", "uid", "parent", "files"];

/// Rendered name of the source of documents that did not come from a file
pub const INLINE_SOURCE: &str = "INLINE_YAML";

/// Where a record was loaded from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceLocation {
    /// An absolute on-disk path
    File(PathBuf),
    /// A document handed in from memory
    Inline,
}

impl SourceLocation {
    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceLocation::File(path) => Some(path),
            SourceLocation::Inline => None,
        }
    }

    /// Name used in error messages, relative to the working directory when possible
    pub fn display_name(&self) -> String {
        simplify_filename(self.path())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::File(path) => write!(f, "{}", path.display()),
            SourceLocation::Inline => write!(f, "{}", INLINE_SOURCE),
        }
    }
}

/// Locates a record by type plus name or uid
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Locator {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl Locator {
    /// Locator for a `(type, name)` pair
    pub fn by_name(record_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            record_type: Some(record_type.into()),
            name: Some(name.into()),
            uid: None,
        }
    }

    /// Locator for a `(type, uid)` pair
    pub fn by_uid(record_type: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            record_type: Some(record_type.into()),
            name: None,
            uid: Some(uid.into()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref t) = self.record_type {
            parts.push(format!("type: {}", t));
        }
        if let Some(ref name) = self.name {
            parts.push(format!("name: {}", name));
        }
        if let Some(ref uid) = self.uid {
            parts.push(format!("uid: {}", uid));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// A declared parent of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Path relative to the declaring record's directory (or absolute)
    ByPath(PathBuf),
    ByLocator(Locator),
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::ByPath(path) => write!(f, "{}", path.display()),
            ParentRef::ByLocator(locator) => write!(f, "{}", locator),
        }
    }
}

/// The `(type, name, uid)` triple that names a record in inherited maps
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordIdentity {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub uid: String,
}

impl RecordIdentity {
    pub fn new(
        record_type: impl Into<String>,
        name: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            name: name.into(),
            uid: uid.into(),
        }
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.record_type, self.name, self.uid)
    }
}

/// One parsed metadata document
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub record_type: String,
    pub name: String,
    pub uid: String,
    pub parents: Vec<ParentRef>,
    /// File paths or glob patterns, relative to the record's directory
    pub tracked_files: Vec<String>,
    pub user_data: UserData,
    pub source: SourceLocation,
}

impl Record {
    /// Read and parse a metadata file
    pub fn from_file(path: &Path) -> Result<Self> {
        let location = SourceLocation::File(path.to_path_buf());
        let source = read_source(&location)?;
        Self::from_yaml_str(&source, location)
    }

    /// Decode YAML source text and build a record from it
    pub fn from_yaml_str(yaml_source: &str, source: SourceLocation) -> Result<Self> {
        let document = decode_yaml(yaml_source, &source)?;
        Self::from_document(document, source)
    }

    /// Build a record from an already-decoded YAML document.
    ///
    /// Pure: the only input is the document and the source identity.
    pub fn from_document(document: serde_yaml::Value, source: SourceLocation) -> Result<Self> {
        let file = source.display_name();
        let mut mapping = match document {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Tagged(tagged) => match tagged.value {
                serde_yaml::Value::Mapping(mapping) => mapping,
                _ => return Err(TameError::malformed(file, "document must be a mapping")),
            },
            _ => {
                return Err(TameError::malformed(
                    file,
                    "type of metadata must be provided as a string",
                ))
            }
        };

        let record_type = match mapping.remove("type") {
            Some(serde_yaml::Value::String(t)) if !t.is_empty() => t,
            _ => {
                return Err(TameError::malformed(
                    file,
                    "type of metadata must be provided as a non-empty string",
                ))
            }
        };

        let name = take_string(&mut mapping, "name", &file)?;
        let uid = take_string(&mut mapping, "uid", &file)?;

        let parents = match take_sequence(&mut mapping, "parent", &file)? {
            Some(entries) => entries
                .into_iter()
                .map(|entry| parse_parent(entry, &file))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let tracked_files = match take_sequence(&mut mapping, "files", &file)? {
            Some(entries) => entries
                .into_iter()
                .map(|entry| match entry {
                    serde_yaml::Value::String(s) => Ok(s),
                    _ => Err(TameError::malformed(
                        file.as_str(),
                        "files key is special: every entry must be a string",
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let user_data = mapping
            .into_iter()
            .map(|(k, v)| (key_text(k), Value::from(v)))
            .collect();

        Ok(Self {
            record_type,
            name: name.unwrap_or_default(),
            uid: uid.unwrap_or_default(),
            parents,
            tracked_files,
            user_data,
            source,
        })
    }

    /// Identity used to key this record's data in inherited maps
    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity::new(&self.record_type, &self.name, &self.uid)
    }

    /// Directory the record lives in; tracked files and path parents are relative to it
    pub fn directory(&self) -> Option<&Path> {
        self.source.path().and_then(Path::parent)
    }
}

/// Decode YAML text, mapping syntax errors to a located `MalformedRecord`
/// Read a YAML file; undecodable text is a malformed document, not an io failure
pub(crate) fn read_source(location: &SourceLocation) -> Result<String> {
    let Some(path) = location.path() else {
        return Ok(String::new());
    };
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData => {
            TameError::malformed(location.display_name(), "file is not valid UTF-8")
        }
        _ => TameError::from(e),
    })
}

pub(crate) fn decode_yaml(yaml_source: &str, source: &SourceLocation) -> Result<serde_yaml::Value> {
    serde_yaml::from_str(yaml_source).map_err(|e| {
        let location = e.location();
        TameError::MalformedRecord {
            file: source.display_name(),
            message: format!("invalid YAML: {}", e),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    })
}

fn take_string(mapping: &mut serde_yaml::Mapping, key: &str, file: &str) -> Result<Option<String>> {
    match mapping.remove(key) {
        None => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(TameError::malformed(
            file,
            format!("{} key is special: value must be provided as a string", key),
        )),
    }
}

fn take_sequence(
    mapping: &mut serde_yaml::Mapping,
    key: &str,
    file: &str,
) -> Result<Option<Vec<serde_yaml::Value>>> {
    match mapping.remove(key) {
        None => Ok(None),
        Some(serde_yaml::Value::Sequence(seq)) => Ok(Some(seq)),
        Some(_) => Err(TameError::malformed(
            file,
            format!("{} key is special: value must be provided as a list", key),
        )),
    }
}

fn parse_parent(entry: serde_yaml::Value, file: &str) -> Result<ParentRef> {
    match entry {
        serde_yaml::Value::String(path) => Ok(ParentRef::ByPath(PathBuf::from(path))),
        serde_yaml::Value::Mapping(mut mapping) => {
            let record_type = take_string(&mut mapping, "type", file)?;
            let name = take_string(&mut mapping, "name", file)?;
            let uid = take_string(&mut mapping, "uid", file)?;
            Ok(ParentRef::ByLocator(Locator {
                record_type,
                name,
                uid,
            }))
        }
        _ => Err(TameError::malformed(
            file,
            "parent entries must be a path string or a {type, name/uid} locator",
        )),
    }
}
