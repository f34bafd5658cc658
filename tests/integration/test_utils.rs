//! Shared test utilities for integration tests
//!
//! Builds temporary workspaces on disk and wires orchestrators over them.

use coaudit::config::StorageConfig;
use coaudit::orchestrator::{NoopNotifier, Orchestrator};
use coaudit::roots::path::canonicalize_root;
use coaudit::store::{AnnotationStore, FsStorage, MemoryStorage};
use coaudit::types::{Entry, EntryDetails, EntryKind, Location};
use coaudit::workspace::{FsSiblingLister, MemorySiblingLister};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Temporary directory holding the given files (relative paths, empty content).
pub fn workspace_with_files(files: &[&str]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for file in files {
        let path = temp_dir.path().join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
    }
    temp_dir
}

/// Canonical form of a temp path, as the orchestrator registers it.
pub fn canonical(path: &Path) -> PathBuf {
    canonicalize_root(path).unwrap()
}

pub fn fs_orchestrator(author: &str) -> Orchestrator<FsStorage> {
    Orchestrator::new(
        author,
        AnnotationStore::new(FsStorage, StorageConfig::default()),
        Arc::new(FsSiblingLister),
        Arc::new(NoopNotifier),
    )
}

pub fn memory_orchestrator(
    author: &str,
    storage: MemoryStorage,
    lister: MemorySiblingLister,
) -> Orchestrator<MemoryStorage> {
    Orchestrator::new(
        author,
        AnnotationStore::new(storage, StorageConfig::default()),
        Arc::new(lister),
        Arc::new(NoopNotifier),
    )
}

pub fn entry(kind: EntryKind, author: &str, label: &str, root: &str, spans: &[(&str, u32, u32)]) -> Entry {
    Entry::new(
        kind,
        author,
        label,
        EntryDetails::default(),
        spans
            .iter()
            .map(|&(path, start, end)| Location::new(path, root, start, end))
            .collect(),
    )
}
