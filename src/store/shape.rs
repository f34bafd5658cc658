//! Persisted document shape (one JSON document per author per root) and its
//! conversion to and from the domain types.

use crate::roots::path::{normalize_foreign_separators, normalize_line_endings, persisted_path};
use crate::types::{
    AnnotationSet, AuditedFile, Entry, EntryDetails, EntryKind, Location, Region, RemoteInfo,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedShape {
    #[serde(default)]
    pub client_remote: String,
    #[serde(default)]
    pub git_remote: String,
    #[serde(default)]
    pub git_sha: String,
    pub tree_entries: Vec<PersistedEntry>,
    pub audited_files: Vec<PersistedAuditedFile>,
    /// Absent in older documents
    #[serde(default)]
    pub partially_audited_files: Vec<PersistedRegion>,
    pub resolved_entries: Vec<PersistedEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistedEntryType {
    Finding,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntry {
    pub label: String,
    pub entry_type: PersistedEntryType,
    pub author: String,
    pub details: PersistedDetails,
    pub locations: Vec<PersistedLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDetails {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default, rename = "type")]
    pub finding_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exploit: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLocation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuditedFile {
    pub path: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRegion {
    pub path: String,
    pub author: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl From<EntryKind> for PersistedEntryType {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Finding => PersistedEntryType::Finding,
            EntryKind::Note => PersistedEntryType::Note,
        }
    }
}

impl From<PersistedEntryType> for EntryKind {
    fn from(kind: PersistedEntryType) -> Self {
        match kind {
            PersistedEntryType::Finding => EntryKind::Finding,
            PersistedEntryType::Note => EntryKind::Note,
        }
    }
}

impl PersistedShape {
    /// Build the document for an annotation set.
    pub fn from_set(set: &AnnotationSet) -> Self {
        Self {
            client_remote: set.remote.client_remote.clone(),
            git_remote: set.remote.git_remote.clone(),
            git_sha: set.remote.git_sha.clone(),
            tree_entries: set.entries.iter().map(PersistedEntry::from_entry).collect(),
            audited_files: set
                .audited
                .iter()
                .map(|a| PersistedAuditedFile {
                    path: persisted_path(&a.path),
                    author: a.author.clone(),
                })
                .collect(),
            partially_audited_files: set
                .regions
                .iter()
                .map(|r| PersistedRegion {
                    path: persisted_path(&r.path),
                    author: r.author.clone(),
                    start_line: r.start_line,
                    end_line: r.end_line,
                })
                .collect(),
            resolved_entries: set.resolved.iter().map(PersistedEntry::from_entry).collect(),
        }
    }

    /// Convert to domain types for `root`, rewriting foreign path separators
    /// and line endings to the host convention. `exists` reports whether a
    /// path exists verbatim on disk.
    pub fn into_set(self, root: &Path, exists: impl Fn(&Path) -> bool) -> AnnotationSet {
        let fix_path = |p: &str| normalize_foreign_separators(p, root, &exists);

        let audited = self
            .audited_files
            .iter()
            .map(|a| AuditedFile::new(fix_path(&a.path), a.author.clone()))
            .collect();
        let regions = self
            .partially_audited_files
            .iter()
            .map(|r| Region::new(fix_path(&r.path), r.author.clone(), r.start_line, r.end_line))
            .collect();
        let entries = self
            .tree_entries
            .into_iter()
            .map(|e| e.into_entry(root, &fix_path))
            .collect();
        let resolved = self
            .resolved_entries
            .into_iter()
            .map(|e| e.into_entry(root, &fix_path))
            .collect();

        AnnotationSet {
            remote: RemoteInfo {
                client_remote: self.client_remote,
                git_remote: self.git_remote,
                git_sha: self.git_sha,
            },
            entries,
            resolved,
            audited,
            regions,
        }
    }
}

impl PersistedEntry {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            label: entry.label.clone(),
            entry_type: entry.kind().into(),
            author: entry.author().to_string(),
            details: PersistedDetails {
                severity: entry.details.severity.clone(),
                difficulty: entry.details.difficulty.clone(),
                finding_type: entry.details.finding_type.clone(),
                description: entry.details.description.clone(),
                exploit: entry.details.exploit.clone(),
                recommendation: entry.details.recommendation.clone(),
            },
            locations: entry
                .locations
                .iter()
                .map(|l| PersistedLocation {
                    path: persisted_path(&l.path),
                    start_line: l.start_line,
                    end_line: l.end_line,
                    label: l.label.clone(),
                    description: l.description.clone(),
                })
                .collect(),
        }
    }

    fn into_entry(self, root: &Path, fix_path: &impl Fn(&str) -> std::path::PathBuf) -> Entry {
        let details = EntryDetails {
            severity: self.details.severity,
            difficulty: self.details.difficulty,
            finding_type: self.details.finding_type,
            description: normalize_line_endings(&self.details.description),
            exploit: normalize_line_endings(&self.details.exploit),
            recommendation: normalize_line_endings(&self.details.recommendation),
        };
        let locations = self
            .locations
            .into_iter()
            .map(|l| {
                let mut location = Location::new(fix_path(&l.path), root, l.start_line, l.end_line);
                location.label = l.label;
                location.description = normalize_line_endings(&l.description);
                location
            })
            .collect();
        Entry::new(
            self.entry_type.into(),
            self.author,
            self.label,
            details,
            locations,
        )
    }
}
