//! Core annotation types: regions, audited files, entries and their locations.

use std::fmt;
use std::path::{Path, PathBuf};

/// A partially audited line span. Bounds are inclusive and 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    /// Path relative to the owning workspace root
    pub path: PathBuf,
    pub author: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl Region {
    /// Create a region, swapping the bounds if they are reversed.
    pub fn new(
        path: impl Into<PathBuf>,
        author: impl Into<String>,
        start_line: u32,
        end_line: u32,
    ) -> Self {
        let (start_line, end_line) = if start_line <= end_line {
            (start_line, end_line)
        } else {
            (end_line, start_line)
        };
        Self {
            path: path.into(),
            author: author.into(),
            start_line,
            end_line,
        }
    }

    /// Same `(path, author)` key.
    pub fn same_key(&self, other: &Region) -> bool {
        self.path == other.path && self.author == other.author
    }

    /// True if `other`'s span lies entirely inside this span.
    pub fn contains(&self, other: &Region) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }

    /// True if the spans overlap or are line-adjacent.
    pub fn touches(&self, other: &Region) -> bool {
        other.start_line <= self.end_line.saturating_add(1)
            && self.start_line <= other.end_line.saturating_add(1)
    }

    pub fn line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

/// Whole-file (or whole-directory) audit marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuditedFile {
    pub path: PathBuf,
    pub author: String,
}

impl AuditedFile {
    pub fn new(path: impl Into<PathBuf>, author: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            author: author.into(),
        }
    }
}

/// Kind of annotation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Finding,
    Note,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Finding => "finding",
            EntryKind::Note => "note",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "finding" => Some(EntryKind::Finding),
            "note" => Some(EntryKind::Note),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form finding details. Empty strings mean "not filled in".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDetails {
    pub severity: String,
    pub difficulty: String,
    pub finding_type: String,
    pub description: String,
    pub exploit: String,
    pub recommendation: String,
}

/// One code span belonging to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path relative to `root_path`
    pub path: PathBuf,
    pub root_path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
    pub label: String,
    pub description: String,
}

impl Location {
    pub fn new(
        path: impl Into<PathBuf>,
        root_path: impl Into<PathBuf>,
        start_line: u32,
        end_line: u32,
    ) -> Self {
        let (start_line, end_line) = if start_line <= end_line {
            (start_line, end_line)
        } else {
            (end_line, start_line)
        };
        Self {
            path: path.into(),
            root_path: root_path.into(),
            start_line,
            end_line,
            label: String::new(),
            description: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Key used for structural comparison; label and description are cosmetic.
    pub fn span_key(&self) -> (&Path, u32, u32) {
        (self.path.as_path(), self.start_line, self.end_line)
    }

    pub fn intersects(&self, path: &Path, start_line: u32, end_line: u32) -> bool {
        self.path == path && self.start_line <= end_line && start_line <= self.end_line
    }

    pub fn absolute_path(&self) -> PathBuf {
        self.root_path.join(&self.path)
    }
}

/// A finding or note spanning one or more locations.
///
/// `kind` and `author` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub label: String,
    kind: EntryKind,
    author: String,
    pub details: EntryDetails,
    pub locations: Vec<Location>,
}

impl Entry {
    pub fn new(
        kind: EntryKind,
        author: impl Into<String>,
        label: impl Into<String>,
        details: EntryDetails,
        locations: Vec<Location>,
    ) -> Self {
        Self {
            label: label.into(),
            kind,
            author: author.into(),
            details,
            locations,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

/// Stable handle into an entry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Git context recorded alongside a root's annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteInfo {
    pub client_remote: String,
    pub git_remote: String,
    pub git_sha: String,
}

impl RemoteInfo {
    pub fn is_empty(&self) -> bool {
        self.client_remote.is_empty() && self.git_remote.is_empty() && self.git_sha.is_empty()
    }
}

/// Domain view of one persisted annotation document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    pub remote: RemoteInfo,
    pub entries: Vec<Entry>,
    pub resolved: Vec<Entry>,
    pub audited: Vec<AuditedFile>,
    pub regions: Vec<Region>,
}

impl AnnotationSet {
    /// Nothing worth writing: no remote info and no annotations of any kind.
    pub fn is_empty(&self) -> bool {
        self.remote.is_empty()
            && self.entries.is_empty()
            && self.resolved.is_empty()
            && self.audited.is_empty()
            && self.regions.is_empty()
    }
}

/// One persisted per-author annotation file inside a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    pub file: PathBuf,
    pub author: String,
    pub root_path: PathBuf,
    pub root_label: String,
    /// Data is loaded into the in-memory view
    pub active: bool,
}

/// An editor selection reported by the host, with absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
}

impl Selection {
    pub fn new(path: impl Into<PathBuf>, start_line: u32, end_line: u32) -> Self {
        let (start_line, end_line) = if start_line <= end_line {
            (start_line, end_line)
        } else {
            (end_line, start_line)
        };
        Self {
            path: path.into(),
            start_line,
            end_line,
        }
    }
}
