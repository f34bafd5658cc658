//! Authoritative in-memory annotation state for one workspace root.

use crate::error::ApiError;
use crate::reconcile::{merge_audited_files, merge_entries, merge_regions, merge_sets};
use crate::region::{normalize, toggle_regions};
use crate::roots::path::relative_to;
use crate::roots::WorkspaceRoot;
use crate::store::PersistedShape;
use crate::types::{AnnotationSet, AuditedFile, Entry, EntryId, Location, Region, RemoteInfo};
use crate::workspace::arena::EntryArena;
use crate::workspace::siblings::SiblingLister;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of an audited-status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Absolute paths whose audited status changed (target first, then parents)
    pub affected: Vec<PathBuf>,
    /// Author whose record was added or removed for the target path
    pub author: String,
    /// Every author whose records changed, including removed parent markers
    pub authors: BTreeSet<String>,
    /// Target is audited after the change
    pub audited: bool,
}

/// What happened to an entry when one of its locations was taken away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationRemoval {
    Removed(Location),
    /// That was the last location; the entry is gone
    EntryDeleted(Entry),
}

/// Counts for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootSummary {
    pub entries: usize,
    pub resolved: usize,
    pub audited: usize,
    pub regions: usize,
}

pub struct WorkspaceRootState {
    root: WorkspaceRoot,
    author: String,
    remote: RemoteInfo,
    entries: EntryArena,
    resolved: EntryArena,
    audited: Vec<AuditedFile>,
    regions: Vec<Region>,
    lister: Arc<dyn SiblingLister>,
}

impl WorkspaceRootState {
    pub fn new(root: WorkspaceRoot, author: impl Into<String>, lister: Arc<dyn SiblingLister>) -> Self {
        Self {
            root,
            author: author.into(),
            remote: RemoteInfo::default(),
            entries: EntryArena::new(),
            resolved: EntryArena::new(),
            audited: Vec::new(),
            regions: Vec::new(),
            lister,
        }
    }

    pub fn root(&self) -> &WorkspaceRoot {
        &self.root
    }

    pub fn relabel(&mut self, label: String, degraded: bool) {
        self.root.label = label;
        self.root.degraded = degraded;
    }

    /// Author of local actions.
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn remote(&self) -> &RemoteInfo {
        &self.remote
    }

    pub fn set_remote(&mut self, remote: RemoteInfo) {
        self.remote = remote;
    }

    pub fn relative_path(&self, absolute: &Path) -> Result<PathBuf, ApiError> {
        relative_to(&self.root.path, absolute)
            .ok_or_else(|| ApiError::PathOutsideRoots(absolute.to_path_buf()))
    }

    pub fn summary(&self) -> RootSummary {
        RootSummary {
            entries: self.entries.len(),
            resolved: self.resolved.len(),
            audited: self.audited.len(),
            regions: self.regions.len(),
        }
    }

    // ---- whole-file audit ----

    pub fn audited_files(&self) -> &[AuditedFile] {
        &self.audited
    }

    /// Audited by any author.
    pub fn is_audited(&self, relative: &Path) -> bool {
        self.audited.iter().any(|a| a.path == relative)
    }

    /// Audited itself or through an audited ancestor directory.
    pub fn is_covered(&self, relative: &Path) -> bool {
        relative
            .ancestors()
            .take_while(|p| !p.as_os_str().is_empty())
            .any(|p| self.is_audited(p))
    }

    /// Flip the audited status of `absolute`.
    pub fn toggle_audited(&mut self, absolute: &Path) -> Result<ToggleOutcome, ApiError> {
        let relative = self.relative_path(absolute)?;
        if self.is_audited(&relative) {
            self.unmark_audited(absolute)
        } else {
            self.mark_audited(absolute)
        }
    }

    /// Mark `absolute` audited, clear its partial regions, and mark every
    /// ancestor directory whose entries are now all audited.
    pub fn mark_audited(&mut self, absolute: &Path) -> Result<ToggleOutcome, ApiError> {
        let relative = self.relative_path(absolute)?;
        if relative.as_os_str().is_empty() {
            return Err(ApiError::RootNotMarkable(self.root.path.clone()));
        }
        let mut authors = BTreeSet::new();

        if !self.is_audited(&relative) {
            self.audited
                .push(AuditedFile::new(relative.clone(), self.author.clone()));
            authors.insert(self.author.clone());
        }

        let before = self.regions.len();
        self.regions.retain(|r| {
            if r.path == relative {
                authors.insert(r.author.clone());
                false
            } else {
                true
            }
        });
        if self.regions.len() != before {
            debug!(
                path = %relative.display(),
                cleared = before - self.regions.len(),
                "Full-file audit superseded partial regions"
            );
        }

        let mut affected = vec![self.root.path.join(&relative)];
        let parents = self.propagate_mark(&relative);
        if !parents.is_empty() {
            authors.insert(self.author.clone());
        }
        affected.extend(parents);

        Ok(ToggleOutcome {
            affected,
            author: self.author.clone(),
            authors,
            audited: true,
        })
    }

    /// Remove every audited marker for `absolute` and unmark audited ancestors.
    pub fn unmark_audited(&mut self, absolute: &Path) -> Result<ToggleOutcome, ApiError> {
        let relative = self.relative_path(absolute)?;
        let mut authors = BTreeSet::new();
        let mut author = None;

        self.audited.retain(|a| {
            if a.path == relative {
                author.get_or_insert_with(|| a.author.clone());
                authors.insert(a.author.clone());
                false
            } else {
                true
            }
        });

        let mut affected = vec![self.root.path.join(&relative)];
        let mut current = relative;
        while let Some(parent) = current.parent().map(Path::to_path_buf) {
            if parent.as_os_str().is_empty() || !self.is_audited(&parent) {
                break;
            }
            self.audited.retain(|a| {
                if a.path == parent {
                    authors.insert(a.author.clone());
                    false
                } else {
                    true
                }
            });
            debug!(dir = %parent.display(), "Unmarked audited parent directory");
            affected.push(self.root.path.join(&parent));
            current = parent;
        }

        Ok(ToggleOutcome {
            affected,
            author: author.unwrap_or_else(|| self.author.clone()),
            authors,
            audited: false,
        })
    }

    fn propagate_mark(&mut self, relative: &Path) -> Vec<PathBuf> {
        let mut affected = Vec::new();
        let mut current = relative.to_path_buf();

        while let Some(parent) = current.parent().map(Path::to_path_buf) {
            // The root directory itself is never marked.
            if parent.as_os_str().is_empty() || self.is_audited(&parent) {
                break;
            }
            let dir = self.root.path.join(&parent);
            let names = match self.lister.list(&dir) {
                Ok(names) => names,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Cannot list directory; stopping audit propagation");
                    break;
                }
            };
            if names.is_empty() || !names.iter().all(|name| self.is_audited(&parent.join(name))) {
                break;
            }

            self.audited
                .push(AuditedFile::new(parent.clone(), self.author.clone()));
            debug!(dir = %parent.display(), "All entries audited; marked parent directory");
            affected.push(dir);
            current = parent;
        }
        affected
    }

    // ---- partially audited regions ----

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn regions_for<'a>(&'a self, relative: &'a Path) -> impl Iterator<Item = &'a Region> + 'a {
        self.regions.iter().filter(move |r| r.path == relative)
    }

    /// Toggle `spans` (inclusive, 0-based) for the current author. Returns
    /// whether the region set changed; fully audited files are left alone.
    pub fn add_partially_audited(&mut self, relative: &Path, spans: &[(u32, u32)]) -> bool {
        if self.is_covered(relative) {
            debug!(path = %relative.display(), "File fully audited; ignoring region mark");
            return false;
        }
        let selections: Vec<Region> = spans
            .iter()
            .map(|&(start, end)| Region::new(relative, self.author.clone(), start, end))
            .collect();
        let updated = toggle_regions(&self.regions, &selections);
        let changed = updated != self.regions;
        self.regions = updated;
        changed
    }

    // ---- entries ----

    pub fn add_entry(&mut self, entry: Entry) -> EntryId {
        self.entries.insert(entry)
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Mutable access for label, details and location edits. Kind and author
    /// stay fixed.
    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.get_mut(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.entries.iter()
    }

    pub fn resolved_entry(&self, id: EntryId) -> Option<&Entry> {
        self.resolved.get(id)
    }

    pub fn resolved_entries(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.resolved.iter()
    }

    pub fn delete_entry(&mut self, id: EntryId) -> Result<Entry, ApiError> {
        self.entries.remove(id).ok_or(ApiError::EntryNotFound(id))
    }

    pub fn delete_resolved_entry(&mut self, id: EntryId) -> Result<Entry, ApiError> {
        self.resolved.remove(id).ok_or(ApiError::EntryNotFound(id))
    }

    /// Move an entry to the resolved collection. Returns its resolved id.
    pub fn resolve_entry(&mut self, id: EntryId) -> Result<EntryId, ApiError> {
        let entry = self.delete_entry(id)?;
        Ok(self.resolved.insert(entry))
    }

    /// Move a resolved entry back. Returns its new active id.
    pub fn restore_entry(&mut self, id: EntryId) -> Result<EntryId, ApiError> {
        let entry = self.delete_resolved_entry(id)?;
        Ok(self.entries.insert(entry))
    }

    pub fn add_location(&mut self, id: EntryId, location: Location) -> Result<(), ApiError> {
        let entry = self.entries.get_mut(id).ok_or(ApiError::EntryNotFound(id))?;
        entry.locations.push(location);
        Ok(())
    }

    /// Remove one location; the entry goes with its last location.
    pub fn remove_location(&mut self, id: EntryId, index: usize) -> Result<LocationRemoval, ApiError> {
        let entry = self.entries.get_mut(id).ok_or(ApiError::EntryNotFound(id))?;
        if index >= entry.locations.len() {
            return Err(ApiError::LocationNotFound { entry: id, index });
        }
        let location = entry.locations.remove(index);
        if entry.locations.is_empty() {
            let entry = self.delete_entry(id)?;
            debug!(entry = %id, "Removed last location; entry deleted");
            return Ok(LocationRemoval::EntryDeleted(entry));
        }
        Ok(LocationRemoval::Removed(location))
    }

    /// Drag a location from one entry onto another.
    pub fn move_location(
        &mut self,
        from: EntryId,
        index: usize,
        to: EntryId,
    ) -> Result<LocationRemoval, ApiError> {
        if self.entries.get(to).is_none() {
            return Err(ApiError::EntryNotFound(to));
        }
        let location = match self.entries.get(from) {
            None => return Err(ApiError::EntryNotFound(from)),
            Some(entry) => entry
                .locations
                .get(index)
                .cloned()
                .ok_or(ApiError::LocationNotFound { entry: from, index })?,
        };
        if from == to {
            return Ok(LocationRemoval::Removed(location));
        }
        let removal = self.remove_location(from, index)?;
        self.add_location(to, location)?;
        Ok(removal)
    }

    /// Reorder a location within its entry.
    pub fn reorder_location(&mut self, id: EntryId, from: usize, to: usize) -> Result<(), ApiError> {
        let entry = self.entries.get_mut(id).ok_or(ApiError::EntryNotFound(id))?;
        let len = entry.locations.len();
        if from >= len {
            return Err(ApiError::LocationNotFound { entry: id, index: from });
        }
        if to >= len {
            return Err(ApiError::LocationNotFound { entry: id, index: to });
        }
        let location = entry.locations.remove(from);
        entry.locations.insert(to, location);
        Ok(())
    }

    /// Active entry locations in this root that intersect the given span.
    pub fn locate(&self, relative: &Path, start_line: u32, end_line: u32) -> Vec<(EntryId, usize)> {
        self.entries
            .iter()
            .flat_map(|(id, entry)| {
                entry
                    .locations
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| {
                        l.root_path == self.root.path && l.intersects(relative, start_line, end_line)
                    })
                    .map(move |(i, _)| (id, i))
            })
            .collect()
    }

    // ---- persisted shape ----

    /// Authors with any data in this root.
    pub fn authors(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .chain(self.resolved.iter())
            .map(|(_, e)| e.author().to_string())
            .chain(self.audited.iter().map(|a| a.author.clone()))
            .chain(self.regions.iter().map(|r| r.author.clone()))
            .collect()
    }

    /// Everything `author` owns in this root.
    pub fn snapshot(&self, author: &str) -> AnnotationSet {
        AnnotationSet {
            remote: self.remote.clone(),
            entries: self
                .entries
                .iter()
                .filter(|(_, e)| e.author() == author)
                .map(|(_, e)| e.clone())
                .collect(),
            resolved: self
                .resolved
                .iter()
                .filter(|(_, e)| e.author() == author)
                .map(|(_, e)| e.clone())
                .collect(),
            audited: self
                .audited
                .iter()
                .filter(|a| a.author == author)
                .cloned()
                .collect(),
            regions: self
                .regions
                .iter()
                .filter(|r| r.author == author)
                .cloned()
                .collect(),
        }
    }

    /// Compute the document to write for `author`.
    ///
    /// When the author's record is not active its file content is not in the
    /// view, so the snapshot is merged with `on_disk` to keep edits made
    /// elsewhere. Returns `None` when there is nothing to write and no file
    /// existed.
    pub fn prepare_save(
        &self,
        author: &str,
        active: bool,
        on_disk: Option<&AnnotationSet>,
        file_exists: bool,
    ) -> Option<PersistedShape> {
        let local = self.snapshot(author);
        let merged = match (active, on_disk) {
            (false, Some(disk)) => {
                let mut merged = merge_sets(&local, disk);
                merged.regions = normalize(merged.regions);
                merged
            }
            _ => local,
        };

        if merged.is_empty() && !file_exists {
            debug!(author, root = %self.root.path.display(), "Nothing to save; skipping write");
            return None;
        }
        Some(PersistedShape::from_set(&merged))
    }

    /// Merge a loaded document into the view without duplicating anything
    /// already present.
    pub fn apply_loaded(&mut self, set: &AnnotationSet) {
        if self.remote.is_empty() {
            self.remote = set.remote.clone();
        }

        let existing = self.entries.to_vec();
        for entry in merge_entries(&existing, &set.entries).into_iter().skip(existing.len()) {
            self.entries.insert(entry);
        }
        let existing = self.resolved.to_vec();
        for entry in merge_entries(&existing, &set.resolved).into_iter().skip(existing.len()) {
            self.resolved.insert(entry);
        }

        self.audited = merge_audited_files(&self.audited, &set.audited);
        self.regions = normalize(merge_regions(&self.regions, &set.regions));
    }

    /// Drop everything `author` owns from the view.
    pub fn unload_author(&mut self, author: &str) {
        self.entries.retain(|e| e.author() != author);
        self.resolved.retain(|e| e.author() != author);
        self.audited.retain(|a| a.author != author);
        self.regions.retain(|r| r.author != author);
    }
}

impl std::fmt::Debug for WorkspaceRootState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceRootState")
            .field("root", &self.root)
            .field("author", &self.author)
            .field("summary", &self.summary())
            .finish()
    }
}
