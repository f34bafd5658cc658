//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::PathOutsideRoots(path) => format!(
            "{} is not inside any workspace root (pass --root to add one)",
            path.display()
        ),
        ApiError::InvalidAnnotations { path, source } => {
            format!("{} failed validation: {}", path.display(), source)
        }
        other => other.to_string(),
    }
}
