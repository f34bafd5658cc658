//! Annotation store: discovers, loads and saves per-author documents.
//!
//! Every document lives at `<root>/<dir>/<author>.<extension>`. Saves for the
//! same (root, author) pair are serialized; saves for different pairs run
//! concurrently.

use crate::config::StorageConfig;
use crate::daylog::DayLog;
use crate::error::{ApiError, StorageError};
use crate::roots::WorkspaceRoot;
use crate::store::schema::parse_document;
use crate::store::storage::AnnotationStorage;
use crate::types::{AnnotationSet, ConfigRecord};
use crate::workspace::WorkspaceRootState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

/// One async lock per (root, author).
#[derive(Debug, Default)]
pub struct SaveLocks {
    locks: Mutex<HashMap<(PathBuf, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl SaveLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, root: &Path, author: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .lock()
            .entry((root.to_path_buf(), author.to_string()))
            .or_default()
            .clone();
        lock.lock_owned().await
    }
}

/// Outcome of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(PathBuf),
    /// Nothing to persist and no file existed
    Skipped,
}

pub struct AnnotationStore<S: AnnotationStorage> {
    storage: S,
    layout: StorageConfig,
    locks: SaveLocks,
}

impl<S: AnnotationStorage> AnnotationStore<S> {
    pub fn new(storage: S, layout: StorageConfig) -> Self {
        Self {
            storage,
            layout,
            locks: SaveLocks::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn layout(&self) -> &StorageConfig {
        &self.layout
    }

    pub fn storage_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.layout.dir)
    }

    pub fn config_file(&self, root: &Path, author: &str) -> PathBuf {
        self.storage_dir(root)
            .join(format!("{author}.{}", self.layout.extension))
    }

    pub fn day_log_file(&self, root: &Path) -> PathBuf {
        self.storage_dir(root).join(&self.layout.day_log)
    }

    /// Annotation files present for `root`, one record per author. New
    /// records start inactive.
    pub async fn discover(&self, root: &WorkspaceRoot) -> Result<Vec<ConfigRecord>, StorageError> {
        let dir = self.storage_dir(&root.path);
        let files = self.storage.list_files(&dir).await?;

        let records: Vec<ConfigRecord> = files
            .into_iter()
            .filter(|f| {
                f.extension()
                    .is_some_and(|ext| ext == self.layout.extension.as_str())
            })
            .filter_map(|file| {
                let author = file.file_stem()?.to_str()?.to_string();
                Some(ConfigRecord {
                    file,
                    author,
                    root_path: root.path.clone(),
                    root_label: root.label.clone(),
                    active: false,
                })
            })
            .collect();

        debug!(root = %root.path.display(), count = records.len(), "Discovered annotation files");
        Ok(records)
    }

    /// Read and validate the document behind `record`.
    pub async fn load(&self, record: &ConfigRecord) -> Result<AnnotationSet, ApiError> {
        self.load_file(&record.file, &record.root_path).await
    }

    pub async fn load_file(&self, file: &Path, root: &Path) -> Result<AnnotationSet, ApiError> {
        let text = self.storage.read_to_string(file).await?;
        let shape = parse_document(&text, file)?;
        let set = shape.into_set(root, |p| p.exists());
        debug!(
            file = %file.display(),
            entries = set.entries.len(),
            audited = set.audited.len(),
            regions = set.regions.len(),
            "Loaded annotation file"
        );
        Ok(set)
    }

    /// Persist `author`'s slice of `state`.
    ///
    /// With `active` set the in-memory view is authoritative. Otherwise the
    /// file on disk is read first and merged so concurrent edits survive.
    pub async fn save(
        &self,
        state: &WorkspaceRootState,
        author: &str,
        active: bool,
    ) -> Result<SaveOutcome, ApiError> {
        let root = state.root().path.clone();
        let _guard = self.locks.acquire(&root, author).await;

        let file = self.config_file(&root, author);
        let file_exists = self.storage.exists(&file).await?;
        let on_disk = if !active && file_exists {
            Some(self.load_file(&file, &root).await?)
        } else {
            None
        };

        let Some(shape) = state.prepare_save(author, active, on_disk.as_ref(), file_exists) else {
            return Ok(SaveOutcome::Skipped);
        };

        let text = serde_json::to_string_pretty(&shape).map_err(StorageError::from)?;
        self.storage.write(&file, &text).await?;
        info!(
            file = %file.display(),
            author,
            entries = shape.tree_entries.len(),
            audited = shape.audited_files.len(),
            "Saved annotation file"
        );
        Ok(SaveOutcome::Written(file))
    }

    pub async fn load_day_log(&self, root: &Path) -> Result<DayLog, ApiError> {
        let file = self.day_log_file(root);
        if !self.storage.exists(&file).await? {
            return Ok(DayLog::default());
        }
        let text = self.storage.read_to_string(&file).await?;
        DayLog::from_json(&text).map_err(|source| ApiError::MalformedJson { path: file, source })
    }

    pub async fn save_day_log(&self, root: &Path, log: &DayLog) -> Result<(), ApiError> {
        let file = self.day_log_file(root);
        let text = log.to_json().map_err(StorageError::from)?;
        self.storage.write(&file, &text).await?;
        debug!(file = %file.display(), "Saved day log");
        Ok(())
    }
}
