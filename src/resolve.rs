//! Parent resolution: turns declared parents into edges between handles
//!
//! Resolution never stops at the first failure. Every reference that cannot
//! be resolved is returned as an [`UnresolvedParent`] so callers can report
//! the referring file, the literal reference and the underlying reason.

use crate::cache::{Handle, MetadataCache};
use crate::error::{TameError, ValidationFailure};
use crate::record::ParentRef;

/// A parent reference that failed to resolve
#[derive(Debug)]
pub struct UnresolvedParent {
    pub referrer: Handle,
    pub parent: ParentRef,
    pub error: TameError,
}

impl UnresolvedParent {
    /// Convert into a reportable failure attributed to the referring file
    pub fn into_failure(self, cache: &MetadataCache) -> ValidationFailure {
        ValidationFailure::UnresolvedParent {
            file: cache.relative_path(self.referrer).display().to_string(),
            parent: self.parent.to_string(),
            reason: Box::new(self.error),
        }
    }
}

/// Resolve one parent reference of the record at `referrer`.
///
/// Path references are relative to the referring record's own directory.
/// Locator references only see records that are already loaded.
pub fn resolve_parent(
    cache: &mut MetadataCache,
    referrer: Handle,
    parent: &ParentRef,
) -> Result<Handle, TameError> {
    match parent {
        ParentRef::ByPath(path) => {
            let base = cache
                .get(referrer)
                .directory()
                .map(|dir| dir.to_path_buf())
                .unwrap_or_else(|| cache.root_dir().to_path_buf());
            cache.lookup_by_path(base.join(path))
        }
        ParentRef::ByLocator(locator) => cache.lookup_by_locator(locator),
    }
}

/// Resolve every declared parent of `handle`.
///
/// Returns the resolved parent handles (in declaration order) and the
/// references that failed. A parent whose first load reports a duplicate
/// uid is still linked, since the record itself was stored.
pub fn resolve_parents(
    cache: &mut MetadataCache,
    handle: Handle,
) -> (Vec<Handle>, Vec<UnresolvedParent>) {
    let declared = cache.get(handle).parents.clone();
    let mut resolved = Vec::with_capacity(declared.len());
    let mut failures = Vec::new();

    for parent in declared {
        match resolve_parent(cache, handle, &parent) {
            Ok(parent_handle) => resolved.push(parent_handle),
            Err(error) => {
                if let (TameError::DuplicateUid { .. }, ParentRef::ByPath(path)) = (&error, &parent)
                {
                    let linked = cache
                        .get(handle)
                        .directory()
                        .and_then(|dir| cache.handle_for_path(dir.join(path)));
                    resolved.extend(linked);
                }
                tracing::debug!(
                    "Could not resolve parent {} of {}: {}",
                    parent,
                    cache.relative_path(handle).display(),
                    error
                );
                failures.push(UnresolvedParent {
                    referrer: handle,
                    parent,
                    error,
                });
            }
        }
    }

    (resolved, failures)
}

/// Parent edges over every record loaded in a cache, indexed by handle
#[derive(Debug, Clone, Default)]
pub struct ParentGraph {
    edges: Vec<Vec<Handle>>,
}

impl ParentGraph {
    /// Resolve the parents of every loaded record.
    ///
    /// Path parents may pull new records into the cache; those are resolved
    /// too, so the graph always covers the whole store.
    pub fn build(cache: &mut MetadataCache) -> (Self, Vec<UnresolvedParent>) {
        let mut edges = Vec::with_capacity(cache.len());
        let mut failures = Vec::new();

        // The cache may grow while resolving, so re-check its length each pass
        let mut next = 0;
        while next < cache.len() {
            let (parents, unresolved) = resolve_parents(cache, Handle::from_index(next));
            edges.push(parents);
            failures.extend(unresolved);
            next += 1;
        }

        (Self { edges }, failures)
    }

    /// Build directly from adjacency lists of handle indices
    pub fn from_edges(edges: Vec<Vec<Handle>>) -> Self {
        Self { edges }
    }

    pub fn parents(&self, handle: Handle) -> &[Handle] {
        &self.edges[handle.index()]
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
