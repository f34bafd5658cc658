//! coaudit: Collaborative Code-Audit Annotations
//!
//! Maps paths to workspace roots under nesting and label collisions, merges
//! and splits partially audited line regions, and reconciles per-author
//! annotation files with concurrently edited copies on disk.

pub mod cli;
pub mod config;
pub mod daylog;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod reconcile;
pub mod region;
pub mod roots;
pub mod store;
pub mod types;
pub mod views;
pub mod workspace;
