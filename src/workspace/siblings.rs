//! Directory listing used when audit status propagates to parent directories.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the names of the entries directly inside a directory.
pub trait SiblingLister: Send + Sync {
    fn list(&self, dir: &Path) -> io::Result<Vec<OsString>>;
}

/// Filesystem lister (walkdir, depth 1, sorted by name).
#[derive(Debug, Clone, Default)]
pub struct FsSiblingLister;

impl SiblingLister for FsSiblingLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            names.push(entry.file_name().to_os_string());
        }
        Ok(names)
    }
}

/// Fixed directory layout, keyed by absolute directory path.
#[derive(Debug, Default)]
pub struct MemorySiblingLister {
    dirs: RwLock<BTreeMap<PathBuf, Vec<OsString>>>,
}

impl MemorySiblingLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the files under `root` given as relative paths; every
    /// intermediate directory is registered too.
    pub fn with_files(root: &Path, files: &[&str]) -> Self {
        let lister = Self::new();
        for file in files {
            lister.add_file(root, Path::new(file));
        }
        lister
    }

    pub fn add_file(&self, root: &Path, relative: &Path) {
        let mut dirs = self.dirs.write();
        let mut child = relative.to_path_buf();
        while let Some(parent) = child.parent().map(Path::to_path_buf) {
            let Some(name) = child.file_name().map(|n| n.to_os_string()) else {
                break;
            };
            let dir = if parent.as_os_str().is_empty() {
                root.to_path_buf()
            } else {
                root.join(&parent)
            };
            let names = dirs.entry(dir).or_default();
            if !names.contains(&name) {
                names.push(name);
                names.sort();
            }
            if parent.as_os_str().is_empty() {
                break;
            }
            child = parent;
        }
    }
}

impl SiblingLister for MemorySiblingLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        self.dirs.read().get(dir).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("unknown directory {}", dir.display()),
            )
        })
    }
}
