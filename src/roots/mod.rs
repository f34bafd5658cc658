//! Workspace roots
//!
//! Registered root directories, their collision-free display labels, and the
//! resolver that decides which root(s) a path belongs to.

pub mod labels;
pub mod path;
pub mod resolver;

pub use labels::assign_labels;
pub use resolver::{Classification, RootResolver};

use std::path::PathBuf;

/// A registered workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceRoot {
    /// Absolute, canonical root path
    pub path: PathBuf,
    /// Display label, unique among registered roots
    pub label: String,
    /// Label is empty (filesystem root); still usable
    pub degraded: bool,
}
