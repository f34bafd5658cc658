//! Annotation persistence: document shape, schema validation, storage
//! backends and the per-author store.

pub mod persistence;
pub mod schema;
pub mod shape;
pub mod storage;

pub use persistence::{AnnotationStore, SaveLocks, SaveOutcome};
pub use schema::{parse_document, validate_document};
pub use shape::PersistedShape;
pub use storage::{AnnotationStorage, FsStorage, MemoryStorage};
