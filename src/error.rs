//! Error types for the coaudit annotation engine.

use crate::types::EntryId;
use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize annotations: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Schema violations found while validating a persisted annotation document.
///
/// `at` is a JSON-path-like location such as `treeEntries[1].locations[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{at}: expected an object")]
    NotAnObject { at: String },

    #[error("{at}: missing required field `{field}`")]
    Missing { at: String, field: &'static str },

    #[error("{at}: field `{field}` must be {expected}")]
    WrongType {
        at: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{at}: field `{field}` must not be empty")]
    Empty { at: String, field: &'static str },

    #[error("{at}: field `{field}` has invalid value {value:?}")]
    InvalidValue {
        at: String,
        field: &'static str,
        value: String,
    },
}

/// Errors surfaced by the engine's public operations
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Path is not inside any workspace root: {0}")]
    PathOutsideRoots(PathBuf),

    #[error("Unknown workspace root: {0}")]
    UnknownRoot(PathBuf),

    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Location {index} not found in entry {entry}")]
    LocationNotFound { entry: EntryId, index: usize },

    #[error("A workspace root cannot itself be marked audited: {0}")]
    RootNotMarkable(PathBuf),

    #[error("An entry needs at least one location")]
    EmptySelection,

    #[error("Unknown configuration record: {0}")]
    UnknownRecord(PathBuf),

    #[error("Malformed JSON in {path}: {source}")]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid annotation file {path}: {source}")]
    InvalidAnnotations {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
