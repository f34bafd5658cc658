//! Workspace domain: per-root annotation state, entry storage, and directory
//! listing for audit propagation.

mod arena;
mod facade;
mod siblings;
mod state;

pub use facade::*;
