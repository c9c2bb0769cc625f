//! In-memory metadata cache for one catalog
//!
//! All records live in a single growable store and are referenced by
//! [`Handle`]. Three lookup tables sit on top of the store:
//!
//! - relative path → handle (one-to-one)
//! - (type, uid) → handle (one-to-one, uniqueness enforced)
//! - (type, name) → handles (one-to-many)
//!
//! A path tree mirrors the catalog directory so a whole subtree can be
//! enumerated for validation. Each tree node remembers the modification
//! time seen when it was first inserted.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::config::{CatalogConfig, RootSettings};
use crate::error::{Result, TameError};
use crate::fs_utils::{canonical, walk_catalog};
use crate::record::{Locator, Record};

/// Stable reference to a record inside a [`MetadataCache`].
///
/// Handles are assigned in load order, never reused and never invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Handle(usize);

impl Handle {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Handle(index)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Part of the catalog a query applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Everything,
    /// A directory or a single file, relative to the catalog root (or absolute)
    Path(PathBuf),
}

impl Scope {
    /// Scope for a path; `.` and the empty path mean everything
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str().is_empty() || path == Path::new(".") {
            Scope::Everything
        } else {
            Scope::Path(path)
        }
    }
}

#[derive(Debug, Default)]
struct PathNode {
    children: BTreeMap<OsString, PathNode>,
    modified: Option<SystemTime>,
    handle: Option<Handle>,
}

impl PathNode {
    fn new(disk_path: &Path) -> Self {
        Self {
            children: BTreeMap::new(),
            modified: fs::metadata(disk_path).and_then(|m| m.modified()).ok(),
            handle: None,
        }
    }
}

#[derive(Debug, Default)]
struct TypeTable {
    by_uid: HashMap<String, Handle>,
    by_name: HashMap<String, Vec<Handle>>,
}

/// A file that failed to load during the initial sweep
#[derive(Debug)]
pub struct LoadFailure {
    /// Path relative to the catalog root
    pub path: PathBuf,
    pub error: TameError,
}

/// The catalog store: owns every record and all lookup tables
pub struct MetadataCache {
    root_file: PathBuf,
    root_dir: PathBuf,
    settings: RootSettings,
    records: Vec<Record>,
    rel_paths: Vec<PathBuf>,
    by_path: HashMap<PathBuf, Handle>,
    types: HashMap<String, TypeTable>,
    tree: PathNode,
    load_failures: Vec<LoadFailure>,
}

impl MetadataCache {
    /// Open the catalog delimited by `root_file` and load every metadata
    /// file beneath it.
    ///
    /// Files that fail to load are kept as [`LoadFailure`]s instead of
    /// aborting the sweep.
    pub fn open(root_file: &Path) -> Result<Self> {
        let mut cache = Self::open_lazy(root_file)?;
        cache.sweep()?;
        Ok(cache)
    }

    /// Open the catalog without sweeping; records load on first reference
    pub fn open_lazy(root_file: &Path) -> Result<Self> {
        let root_file = canonical(root_file).map_err(|e| TameError::NotFound {
            what: format!("root file {}: {}", root_file.display(), e),
        })?;
        let root_dir = root_file
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| TameError::NotFound {
                what: format!("directory of root file {}", root_file.display()),
            })?;
        let settings = RootSettings::load_from(&root_file)?;
        let tree = PathNode::new(&root_dir);

        Ok(Self {
            root_file,
            root_dir,
            settings,
            records: Vec::new(),
            rel_paths: Vec::new(),
            by_path: HashMap::new(),
            types: HashMap::new(),
            tree,
            load_failures: Vec::new(),
        })
    }

    fn sweep(&mut self) -> Result<()> {
        let mut files = walk_catalog(&self.root_dir, &self.settings.catalog)?;

        match files.iter().position(|f| *f == self.root_file) {
            Some(idx) => {
                files.remove(idx);
            }
            None if self.settings.catalog.matches_extension(&self.root_file) => {
                return Err(TameError::UntrackedRepository {
                    start: self.root_dir.display().to_string(),
                    reason: "root marker missing from the catalog sweep".to_string(),
                });
            }
            None => {}
        }

        for file in files {
            if let Err(error) = self.load_or_get(&file) {
                let path = file
                    .strip_prefix(&self.root_dir)
                    .unwrap_or(&file)
                    .to_path_buf();
                tracing::warn!("Failed to load {}: {}", path.display(), error);
                self.load_failures.push(LoadFailure { path, error });
            }
        }

        tracing::info!(
            "Loaded {} metadata record(s) from {} ({} failure(s))",
            self.records.len(),
            self.root_dir.display(),
            self.load_failures.len()
        );
        Ok(())
    }

    /// Load the record at `path` (relative to the catalog root, or absolute)
    /// unless it is already indexed, and return its handle.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file does not exist or lies outside the catalog
    /// - `MalformedRecord` if it cannot be parsed
    /// - `DuplicateUid` if its (type, uid) is already taken; the record is
    ///   still stored and indexed by path and name
    pub fn load_or_get(&mut self, path: impl AsRef<Path>) -> Result<Handle> {
        let (abs, rel) = self.resolve_path(path.as_ref())?;
        if let Some(&handle) = self.by_path.get(&rel) {
            return Ok(handle);
        }

        let record = Record::from_file(&abs)?;
        self.insert(rel, record)
    }

    /// Look up a record by path, loading it if needed
    pub fn lookup_by_path(&mut self, path: impl AsRef<Path>) -> Result<Handle> {
        self.load_or_get(path)
    }

    /// Look up an already-loaded record by locator.
    ///
    /// A `uid` takes precedence over a `name`. Name lookups must match
    /// exactly one record.
    pub fn lookup_by_locator(&self, locator: &Locator) -> Result<Handle> {
        let record_type = match locator.record_type.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(TameError::InvalidLocator {
                    message: format!("locator {} does not name a type", locator),
                })
            }
        };
        let table = self.types.get(record_type);

        if let Some(ref uid) = locator.uid {
            return table
                .and_then(|t| t.by_uid.get(uid))
                .copied()
                .ok_or_else(|| TameError::NotFound {
                    what: format!("type={}, uid={}", record_type, uid),
                });
        }

        if let Some(ref name) = locator.name {
            let matches = table
                .and_then(|t| t.by_name.get(name))
                .map(Vec::as_slice)
                .unwrap_or_default();
            return match matches {
                [] => Err(TameError::NotFound {
                    what: format!("type={}, name={}", record_type, name),
                }),
                [handle] => Ok(*handle),
                many => Err(TameError::AmbiguousLocator {
                    record_type: record_type.to_string(),
                    name: name.clone(),
                    candidates: many
                        .iter()
                        .map(|h| self.relative_path(*h).display().to_string())
                        .collect(),
                }),
            };
        }

        Err(TameError::InvalidLocator {
            message: format!("locator {} needs a name or a uid", locator),
        })
    }

    /// Handle of an already-loaded path, without touching the disk
    pub fn handle_for_path(&self, path: impl AsRef<Path>) -> Option<Handle> {
        let rel = self.relative_key(path.as_ref())?;
        self.by_path.get(&rel).copied()
    }

    /// Every handle registered under `scope`, in breadth-first tree order.
    ///
    /// Returns `None` when the scope names nothing the cache knows about.
    pub fn subtree_handles(&self, scope: &Scope) -> Option<Vec<Handle>> {
        let mut node = &self.tree;
        if let Scope::Path(path) = scope {
            let rel = self.relative_key(path)?;
            for part in rel.iter() {
                node = node.children.get(part)?;
            }
        }

        let mut handles = Vec::new();
        let mut queue = VecDeque::from([node]);
        while let Some(node) = queue.pop_front() {
            if let Some(handle) = node.handle {
                handles.push(handle);
            }
            queue.extend(node.children.values());
        }
        Some(handles)
    }

    /// Modification time recorded for a loaded file or directory
    pub fn recorded_mtime(&self, path: impl AsRef<Path>) -> Option<SystemTime> {
        let rel = self.relative_key(path.as_ref())?;
        let mut node = &self.tree;
        for part in rel.iter() {
            node = node.children.get(part)?;
        }
        node.modified
    }

    pub fn get(&self, handle: Handle) -> &Record {
        &self.records[handle.0]
    }

    /// Path of a record relative to the catalog root
    pub fn relative_path(&self, handle: Handle) -> &Path {
        &self.rel_paths[handle.0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All handles currently assigned, in load order
    pub fn handles(&self) -> impl Iterator<Item = Handle> {
        (0..self.records.len()).map(Handle)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn root_file(&self) -> &Path {
        &self.root_file
    }

    pub fn settings(&self) -> &RootSettings {
        &self.settings
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.settings.catalog
    }

    /// Failures collected during the initial sweep
    pub fn load_failures(&self) -> &[LoadFailure] {
        &self.load_failures
    }

    fn insert(&mut self, rel: PathBuf, record: Record) -> Result<Handle> {
        let handle = Handle(self.records.len());
        let table = self.types.entry(record.record_type.clone()).or_default();

        let mut duplicate_of = None;
        if !record.uid.is_empty() {
            match table.by_uid.get(&record.uid) {
                Some(&existing) => duplicate_of = Some(existing),
                None => {
                    table.by_uid.insert(record.uid.clone(), handle);
                }
            }
        }
        if !record.name.is_empty() {
            table
                .by_name
                .entry(record.name.clone())
                .or_default()
                .push(handle);
        }

        self.by_path.insert(rel.clone(), handle);
        self.insert_tree(&rel, handle);
        tracing::debug!(
            "Indexed {} as {} (type={}, name={}, uid={})",
            rel.display(),
            handle,
            record.record_type,
            record.name,
            record.uid
        );

        let duplicate = duplicate_of.map(|existing| TameError::DuplicateUid {
            record_type: record.record_type.clone(),
            uid: record.uid.clone(),
            file: rel.display().to_string(),
            existing: self.relative_path(existing).display().to_string(),
        });
        self.records.push(record);
        self.rel_paths.push(rel);

        match duplicate {
            Some(err) => Err(err),
            None => Ok(handle),
        }
    }

    fn insert_tree(&mut self, rel: &Path, handle: Handle) {
        let mut disk_path = self.root_dir.clone();
        let mut node = &mut self.tree;
        for part in rel.iter() {
            disk_path.push(part);
            node = node
                .children
                .entry(part.to_os_string())
                .or_insert_with(|| PathNode::new(&disk_path));
        }
        node.handle = Some(handle);
    }

    /// Canonical absolute path plus the root-relative key for a metadata file
    fn resolve_path(&self, path: &Path) -> Result<(PathBuf, PathBuf)> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        };
        let abs = canonical(&joined).map_err(|_| TameError::NotFound {
            what: format!("metadata file {} does not exist", path.display()),
        })?;
        if !abs.is_file() {
            return Err(TameError::NotFound {
                what: format!("{} is not a file", path.display()),
            });
        }
        let rel = abs
            .strip_prefix(&self.root_dir)
            .map_err(|_| TameError::NotFound {
                what: format!(
                    "{} lies outside the catalog rooted at {}",
                    path.display(),
                    self.root_dir.display()
                ),
            })?
            .to_path_buf();
        Ok((abs, rel))
    }

    /// Root-relative lookup key for a path, resolved lexically
    pub(crate) fn relative_key(&self, path: &Path) -> Option<PathBuf> {
        let rel = if path.is_absolute() {
            match path.strip_prefix(&self.root_dir) {
                Ok(rel) => rel.to_path_buf(),
                // The caller may hold a non-canonical spelling of the root
                Err(_) => canonical(path).ok()?.strip_prefix(&self.root_dir).ok()?.to_path_buf(),
            }
        } else {
            path.to_path_buf()
        };

        let mut key = PathBuf::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => key.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !key.pop() {
                        return None;
                    }
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(key)
    }
}

impl fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataCache")
            .field("root_dir", &self.root_dir)
            .field("records", &self.records.len())
            .field("load_failures", &self.load_failures.len())
            .finish()
    }
}
