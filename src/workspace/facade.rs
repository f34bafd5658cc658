//! Re-exports for consumers that depend on `crate::workspace` only.

pub use super::arena::EntryArena;
pub use super::siblings::{FsSiblingLister, MemorySiblingLister, SiblingLister};
pub use super::state::{LocationRemoval, RootSummary, ToggleOutcome, WorkspaceRootState};
