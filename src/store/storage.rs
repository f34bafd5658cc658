//! Storage collaborator: where persisted documents and day logs are read from
//! and written to.

use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File access used by the annotation store.
#[async_trait]
pub trait AnnotationStorage: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    async fn read_to_string(&self, path: &Path) -> Result<String, StorageError>;

    /// Write `contents`, creating parent directories as needed.
    async fn write(&self, path: &Path, contents: &str) -> Result<(), StorageError>;

    /// Files directly inside `dir`; empty when `dir` does not exist.
    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;
}

/// Local filesystem storage backed by `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

#[async_trait]
impl AnnotationStorage for FsStorage {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, StorageError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let mut read_dir = match tokio::fs::read_dir(dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| StorageError::io(dir, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(entry.path(), e))?;
            if file_type.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// In-memory storage for hosts without a filesystem and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a file synchronously.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.lock().insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

#[async_trait]
impl AnnotationStorage for MemoryStorage {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self.files.lock().contains_key(path))
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, StorageError> {
        self.files.lock().get(path).cloned().ok_or_else(|| {
            StorageError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<(), StorageError> {
        self.files
            .lock()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        Ok(self
            .files
            .lock()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}
