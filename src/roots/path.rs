//! Path canonicalization, containment and host-convention normalization

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use unicode_normalization::UnicodeNormalization;

#[cfg(windows)]
const FOREIGN_SEPARATOR: char = '/';
#[cfg(not(windows))]
const FOREIGN_SEPARATOR: char = '\\';

/// Canonicalize and normalize a workspace root path
///
/// This function:
/// 1. Canonicalizes the path (resolves symlinks, `..`, `.`)
/// 2. Normalizes Unicode to NFC
/// 3. Removes trailing slashes (except root)
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, StorageError> {
    // Use dunce for cross-platform canonicalization
    let canonical = dunce::canonicalize(path).map_err(|e| {
        StorageError::InvalidPath(format!(
            "Failed to canonicalize {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(PathBuf::from(normalize_path_string(&canonical.to_string_lossy())))
}

/// Normalize a path string without filesystem access: NFC, no trailing slash
/// (except root).
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    if result.len() > 1 {
        while result.ends_with('/') || result.ends_with('\\') {
            result.pop();
        }
    }
    result
}

/// Resolve `.` and `..` components lexically and normalize Unicode.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let normalized = PathBuf::from(normalize_path_string(&path.to_string_lossy()));
    let mut out = PathBuf::new();
    for component in normalized.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative path of `path` inside `root`, or `None` when `path` is outside.
///
/// A path is inside when the relative path neither begins with a parent
/// traversal nor is absolute. The root itself yields an empty relative path.
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    let root = lexical_normalize(root);
    let path = lexical_normalize(path);
    path.strip_prefix(&root).ok().map(Path::to_path_buf)
}

/// Last path segment, or the empty string for a filesystem root.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Rewrite a persisted relative path to the host's separator when it looks
/// foreign: it contains the other platform's separator and does not exist
/// verbatim under `root`.
pub fn normalize_foreign_separators(
    relative: &str,
    root: &Path,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    if !relative.contains(FOREIGN_SEPARATOR) || exists(&root.join(relative)) {
        return PathBuf::from(relative);
    }
    PathBuf::from(relative.replace(FOREIGN_SEPARATOR, &MAIN_SEPARATOR.to_string()))
}

/// Convert free text to the host line-ending convention.
pub fn normalize_line_endings(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    if cfg!(windows) {
        unix.replace('\n', "\r\n")
    } else {
        unix
    }
}

/// String form used in persisted documents.
pub fn persisted_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
