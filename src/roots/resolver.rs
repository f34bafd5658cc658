//! Path to workspace-root resolution with nested-root handling and caching

use crate::roots::labels::assign_labels;
use crate::roots::path::{lexical_normalize, relative_to};
use crate::roots::WorkspaceRoot;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of classifying an absolute path against the registered roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Innermost containing root, if any
    pub root: Option<WorkspaceRoot>,
    /// Path relative to `root`; the input path when no root contains it
    pub relative_path: PathBuf,
    /// More than one registered root contains the path
    pub ambiguous: bool,
}

/// Maps absolute paths to registered workspace roots.
///
/// Classification results are cached per normalized path; the cache is dropped
/// whenever the root set changes.
#[derive(Debug, Default)]
pub struct RootResolver {
    roots: Vec<WorkspaceRoot>,
    cache: Mutex<HashMap<PathBuf, Classification>>,
}

impl RootResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots(paths: Vec<PathBuf>) -> Self {
        let mut resolver = Self::new();
        resolver.set_roots(paths);
        resolver
    }

    /// Replace the registered root set and relabel. Duplicate paths are dropped.
    pub fn set_roots(&mut self, paths: Vec<PathBuf>) -> &[WorkspaceRoot] {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            let path = lexical_normalize(&path);
            if !unique.contains(&path) {
                unique.push(path);
            }
        }

        for (i, outer) in unique.iter().enumerate() {
            for inner in unique.iter().skip(i + 1) {
                if inner.starts_with(outer) || outer.starts_with(inner) {
                    warn!(
                        outer = %outer.display(),
                        inner = %inner.display(),
                        "Nested workspace roots are not fully supported; paths inside both will be treated as ambiguous"
                    );
                }
            }
        }

        self.roots = assign_labels(&unique);
        self.invalidate_cache();
        debug!(count = self.roots.len(), "Workspace roots relabeled");
        &self.roots
    }

    pub fn roots(&self) -> &[WorkspaceRoot] {
        &self.roots
    }

    pub fn root(&self, root_path: &Path) -> Option<&WorkspaceRoot> {
        let root_path = lexical_normalize(root_path);
        self.roots.iter().find(|r| r.path == root_path)
    }

    pub fn is_multi_root(&self) -> bool {
        self.roots.len() > 1
    }

    pub fn invalidate_cache(&self) {
        self.cache.lock().clear();
    }

    /// Classify `path`, preferring the root with the shortest relative path.
    pub fn classify(&self, path: &Path) -> Classification {
        let key = lexical_normalize(path);
        if let Some(hit) = self.cache.lock().get(&key) {
            return hit.clone();
        }

        let containing = self.classify_all(&key);
        let ambiguous = containing.len() > 1;
        let classification = match containing
            .into_iter()
            .min_by_key(|(_, relative)| relative.as_os_str().len())
        {
            Some((root, relative_path)) => Classification {
                root: Some(root),
                relative_path,
                ambiguous,
            },
            None => Classification {
                root: None,
                relative_path: key.clone(),
                ambiguous: false,
            },
        };

        self.cache.lock().insert(key, classification.clone());
        classification
    }

    /// Every root containing `path`, in registration order.
    pub fn classify_all(&self, path: &Path) -> Vec<(WorkspaceRoot, PathBuf)> {
        self.roots
            .iter()
            .filter_map(|root| relative_to(&root.path, path).map(|rel| (root.clone(), rel)))
            .collect()
    }

    /// Display path that stays unique across roots: prefixed with the root label
    /// only when more than one root is registered.
    pub fn unique_path(&self, root: &WorkspaceRoot, relative: &Path) -> PathBuf {
        if self.is_multi_root() {
            Path::new(&root.label).join(relative)
        } else {
            relative.to_path_buf()
        }
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}
