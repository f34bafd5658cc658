//! Reconciliation orchestrator.
//!
//! Host-facing entry point: owns the root resolver, one state per root, the
//! configuration records and day logs, and routes every change to the right
//! root and author file.

use crate::daylog::DayLog;
use crate::error::ApiError;
use crate::roots::path::{canonicalize_root, lexical_normalize, persisted_path};
use crate::roots::{Classification, RootResolver, WorkspaceRoot};
use crate::store::{AnnotationStorage, AnnotationStore, SaveOutcome};
use crate::types::{ConfigRecord, Entry, EntryDetails, EntryId, EntryKind, Location, Selection};
use crate::views::{build_tree, TreeNode, ViewPolicy};
use crate::workspace::{LocationRemoval, SiblingLister, ToggleOutcome, WorkspaceRootState};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Receives refresh requests whenever decorations or views are stale.
pub trait Notifier: Send + Sync {
    fn refresh(&self, paths: &[PathBuf]);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn refresh(&self, _paths: &[PathBuf]) {}
}

/// Audit toggle applied to one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditToggle {
    pub root: PathBuf,
    pub outcome: ToggleOutcome,
}

/// An entry location intersecting a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedEntry {
    pub root: PathBuf,
    pub entry: EntryId,
    pub location: usize,
}

pub struct Orchestrator<S: AnnotationStorage> {
    author: String,
    resolver: RootResolver,
    states: BTreeMap<PathBuf, WorkspaceRootState>,
    records: Vec<ConfigRecord>,
    day_logs: BTreeMap<PathBuf, DayLog>,
    store: AnnotationStore<S>,
    lister: Arc<dyn SiblingLister>,
    notifier: Arc<dyn Notifier>,
}

impl<S: AnnotationStorage> Orchestrator<S> {
    pub fn new(
        author: impl Into<String>,
        store: AnnotationStore<S>,
        lister: Arc<dyn SiblingLister>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            author: author.into(),
            resolver: RootResolver::new(),
            states: BTreeMap::new(),
            records: Vec::new(),
            day_logs: BTreeMap::new(),
            store,
            lister,
            notifier,
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn resolver(&self) -> &RootResolver {
        &self.resolver
    }

    pub fn roots(&self) -> &[WorkspaceRoot] {
        self.resolver.roots()
    }

    pub fn store(&self) -> &AnnotationStore<S> {
        &self.store
    }

    pub fn records(&self) -> &[ConfigRecord] {
        &self.records
    }

    pub fn state(&self, root: &Path) -> Option<&WorkspaceRootState> {
        self.states.get(root)
    }

    pub fn state_mut(&mut self, root: &Path) -> Option<&mut WorkspaceRootState> {
        self.states.get_mut(root)
    }

    /// States in root registration order.
    pub fn states(&self) -> impl Iterator<Item = &WorkspaceRootState> {
        self.resolver
            .roots()
            .iter()
            .filter_map(|root| self.states.get(&root.path))
    }

    pub fn day_log(&self, root: &Path) -> Option<&DayLog> {
        self.day_logs.get(root)
    }

    pub fn classify(&self, path: &Path) -> Classification {
        self.resolver.classify(&lexical_normalize(path))
    }

    /// Display path of `absolute`, label-prefixed when several roots are open.
    pub fn unique_path(&self, absolute: &Path) -> Result<PathBuf, ApiError> {
        let classification = self.classify(absolute);
        let root = classification
            .root
            .ok_or_else(|| ApiError::PathOutsideRoots(absolute.to_path_buf()))?;
        Ok(self.resolver.unique_path(&root, &classification.relative_path))
    }

    pub fn tree(&self, policy: &ViewPolicy) -> Vec<TreeNode> {
        build_tree(self.states(), &self.resolver, policy)
    }

    /// Apply a root set change: drop removed roots, relabel the survivors
    /// and new roots, then discover and load files for the new roots.
    pub async fn handle_roots_changed(
        &mut self,
        added: &[PathBuf],
        removed: &[PathBuf],
    ) -> Result<Vec<WorkspaceRoot>, ApiError> {
        let added: Vec<PathBuf> = added.iter().map(|p| canonical_or_lexical(p)).collect();
        let removed: Vec<PathBuf> = removed.iter().map(|p| canonical_or_lexical(p)).collect();

        for root in &removed {
            if self.states.remove(root).is_some() {
                info!(root = %root.display(), "Workspace root removed");
            }
            self.records.retain(|r| &r.root_path != root);
            self.day_logs.remove(root);
        }

        let mut paths: Vec<PathBuf> = self
            .resolver
            .roots()
            .iter()
            .map(|r| r.path.clone())
            .filter(|p| !removed.contains(p))
            .collect();
        let mut fresh = Vec::new();
        for path in added {
            if !paths.contains(&path) {
                paths.push(path.clone());
                fresh.push(path);
            }
        }

        let roots = self.resolver.set_roots(paths).to_vec();
        for root in &roots {
            if let Some(state) = self.states.get_mut(&root.path) {
                state.relabel(root.label.clone(), root.degraded);
            }
            for record in self.records.iter_mut().filter(|r| r.root_path == root.path) {
                record.root_label = root.label.clone();
            }
        }

        for path in &fresh {
            let Some(root) = roots.iter().find(|r| &r.path == path).cloned() else {
                continue;
            };
            self.open_root(root).await;
        }

        self.notifier.refresh(&fresh);
        Ok(roots)
    }

    async fn open_root(&mut self, root: WorkspaceRoot) {
        info!(root = %root.path.display(), label = %root.label, "Workspace root added");
        let mut state = WorkspaceRootState::new(root.clone(), self.author.clone(), self.lister.clone());

        match self.store.discover(&root).await {
            Ok(records) => {
                for mut record in records {
                    if record.author == self.author {
                        match self.store.load(&record).await {
                            Ok(set) => {
                                state.apply_loaded(&set);
                                record.active = true;
                            }
                            Err(e) => {
                                error!(file = %record.file.display(), error = %e, "Failed to load annotation file")
                            }
                        }
                    }
                    self.records.push(record);
                }
            }
            Err(e) => error!(root = %root.path.display(), error = %e, "Failed to discover annotation files"),
        }

        let day_log = match self.store.load_day_log(&root.path).await {
            Ok(log) => log,
            Err(e) => {
                warn!(root = %root.path.display(), error = %e, "Ignoring unreadable day log");
                DayLog::default()
            }
        };

        self.day_logs.insert(root.path.clone(), day_log);
        self.states.insert(root.path, state);
    }

    /// Activate or deactivate a configuration record. Returns the new state.
    pub async fn toggle_record(&mut self, file: &Path) -> Result<bool, ApiError> {
        let index = self
            .records
            .iter()
            .position(|r| r.file == file)
            .ok_or_else(|| ApiError::UnknownRecord(file.to_path_buf()))?;
        let record = self.records[index].clone();
        let state = self
            .states
            .get_mut(&record.root_path)
            .ok_or_else(|| ApiError::UnknownRoot(record.root_path.clone()))?;

        if record.active {
            state.unload_author(&record.author);
        } else {
            let set = self.store.load(&record).await?;
            state.apply_loaded(&set);
        }
        self.records[index].active = !record.active;
        info!(file = %file.display(), active = !record.active, "Configuration record toggled");

        self.notifier.refresh(&[record.root_path]);
        Ok(!record.active)
    }

    /// Flip the audited status of `path`.
    ///
    /// When several roots contain the path: if it is audited in any of them it
    /// is unmarked everywhere it is marked, otherwise it is marked in all.
    pub async fn handle_toggle_audited(&mut self, path: &Path) -> Result<Vec<AuditToggle>, ApiError> {
        let path = lexical_normalize(path);
        let containing = self.resolver.classify_all(&path);
        if containing.is_empty() {
            return Err(ApiError::PathOutsideRoots(path));
        }

        let mut toggles = Vec::new();
        if let [(root, _)] = containing.as_slice() {
            let state = self.state_for(&root.path)?;
            toggles.push(AuditToggle {
                root: root.path.clone(),
                outcome: state.toggle_audited(&path)?,
            });
        } else {
            warn!(path = %path.display(), roots = containing.len(), "Path is inside nested roots");
            let audited_anywhere = containing.iter().any(|(root, relative)| {
                self.states
                    .get(&root.path)
                    .is_some_and(|s| s.is_audited(relative))
            });
            for (root, relative) in &containing {
                if relative.as_os_str().is_empty() {
                    debug!(root = %root.path.display(), "Skipping root directory itself");
                    continue;
                }
                let state = self.state_for(&root.path)?;
                let outcome = if audited_anywhere {
                    if !state.is_audited(relative) {
                        continue;
                    }
                    state.unmark_audited(&path)?
                } else {
                    state.mark_audited(&path)?
                };
                toggles.push(AuditToggle {
                    root: root.path.clone(),
                    outcome,
                });
            }
        }

        let mut refreshed = Vec::new();
        for toggle in &toggles {
            for author in &toggle.outcome.authors {
                self.persist(&toggle.root, author).await?;
            }
            self.update_day_log(&toggle.root, &path, toggle.outcome.audited)
                .await;
            refreshed.extend(toggle.outcome.affected.iter().cloned());
        }

        self.notifier.refresh(&refreshed);
        Ok(toggles)
    }

    /// Record or forget `path` in the root's day log. A failed write is
    /// logged; the annotation file is already saved at this point.
    async fn update_day_log(&mut self, root: &Path, path: &Path, audited: bool) {
        let Some(relative) = crate::roots::path::relative_to(root, path) else {
            return;
        };
        let relative = persisted_path(&relative);
        let log = self.day_logs.entry(root.to_path_buf()).or_default();
        let changed = if audited {
            log.record(DayLog::today(), relative)
        } else {
            log.forget(&relative)
        };
        if changed {
            if let Err(e) = self.store.save_day_log(root, log).await {
                warn!(root = %root.display(), error = %e, "Cannot write day log");
            }
        }
    }

    /// Toggle partially audited regions for the current author. Selections
    /// are grouped by their innermost root and file. Returns the files whose
    /// regions changed.
    pub async fn handle_region_mark(&mut self, selections: &[Selection]) -> Result<Vec<PathBuf>, ApiError> {
        let mut groups: BTreeMap<(PathBuf, PathBuf), Vec<(u32, u32)>> = BTreeMap::new();
        for selection in selections {
            let classification = self.classify(&selection.path);
            let root = classification
                .root
                .ok_or_else(|| ApiError::PathOutsideRoots(selection.path.clone()))?;
            groups
                .entry((root.path, classification.relative_path))
                .or_default()
                .push((selection.start_line, selection.end_line));
        }

        let mut changed_files = Vec::new();
        let mut changed_roots = BTreeSet::new();
        for ((root, relative), spans) in groups {
            let state = self.state_for(&root)?;
            if state.add_partially_audited(&relative, &spans) {
                changed_files.push(root.join(&relative));
                changed_roots.insert(root);
            }
        }

        let author = self.author.clone();
        for root in &changed_roots {
            self.persist(root, &author).await?;
        }

        debug!(files = changed_files.len(), "Region mark applied");
        self.notifier.refresh(&changed_files);
        Ok(changed_files)
    }

    /// Entry locations intersecting `selection` in every root containing it.
    pub fn locate_selection(&self, selection: &Selection) -> Vec<LocatedEntry> {
        let path = lexical_normalize(&selection.path);
        self.resolver
            .classify_all(&path)
            .into_iter()
            .flat_map(|(root, relative)| {
                self.states
                    .get(&root.path)
                    .map(|s| s.locate(&relative, selection.start_line, selection.end_line))
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |(entry, location)| LocatedEntry {
                        root: root.path.clone(),
                        entry,
                        location,
                    })
            })
            .collect()
    }

    /// Create an entry from one or more selections. The entry is stored in
    /// the root of its first location.
    pub async fn handle_add_entry(
        &mut self,
        kind: EntryKind,
        label: &str,
        details: EntryDetails,
        selections: &[Selection],
    ) -> Result<(PathBuf, EntryId), ApiError> {
        let mut locations = Vec::with_capacity(selections.len());
        for selection in selections {
            let classification = self.classify(&selection.path);
            let root = classification
                .root
                .ok_or_else(|| ApiError::PathOutsideRoots(selection.path.clone()))?;
            locations.push(Location::new(
                classification.relative_path,
                root.path,
                selection.start_line,
                selection.end_line,
            ));
        }
        let owner = locations
            .first()
            .map(|l| l.root_path.clone())
            .ok_or(ApiError::EmptySelection)?;

        let entry = Entry::new(kind, self.author.clone(), label, details, locations);
        let id = self.state_for(&owner)?.add_entry(entry);
        info!(entry = %id, kind = %kind, label, "Entry added");

        let author = self.author.clone();
        self.persist(&owner, &author).await?;
        self.notifier.refresh(&[owner.clone()]);
        Ok((owner, id))
    }

    pub async fn handle_resolve_entry(&mut self, root: &Path, id: EntryId) -> Result<EntryId, ApiError> {
        let state = self.state_for(root)?;
        let resolved = state.resolve_entry(id)?;
        let author = entry_author(state.resolved_entry(resolved));
        self.finish_entry_change(root, author).await?;
        Ok(resolved)
    }

    pub async fn handle_restore_entry(&mut self, root: &Path, id: EntryId) -> Result<EntryId, ApiError> {
        let state = self.state_for(root)?;
        let restored = state.restore_entry(id)?;
        let author = entry_author(state.entry(restored));
        self.finish_entry_change(root, author).await?;
        Ok(restored)
    }

    pub async fn handle_delete_entry(&mut self, root: &Path, id: EntryId) -> Result<Entry, ApiError> {
        let entry = self.state_for(root)?.delete_entry(id)?;
        self.finish_entry_change(root, Some(entry.author().to_string()))
            .await?;
        Ok(entry)
    }

    pub async fn handle_delete_resolved_entry(&mut self, root: &Path, id: EntryId) -> Result<Entry, ApiError> {
        let entry = self.state_for(root)?.delete_resolved_entry(id)?;
        self.finish_entry_change(root, Some(entry.author().to_string()))
            .await?;
        Ok(entry)
    }

    pub async fn handle_remove_location(
        &mut self,
        root: &Path,
        id: EntryId,
        index: usize,
    ) -> Result<LocationRemoval, ApiError> {
        let state = self.state_for(root)?;
        let author = entry_author(state.entry(id));
        let removal = state.remove_location(id, index)?;
        self.finish_entry_change(root, author).await?;
        Ok(removal)
    }

    /// Move a location onto another entry of the same root. Both authors'
    /// files are saved.
    pub async fn handle_move_location(
        &mut self,
        root: &Path,
        from: EntryId,
        index: usize,
        to: EntryId,
    ) -> Result<LocationRemoval, ApiError> {
        let state = self.state_for(root)?;
        let source_author = entry_author(state.entry(from));
        let target_author = entry_author(state.entry(to));
        let removal = state.move_location(from, index, to)?;

        if let Some(author) = source_author.as_deref() {
            self.persist(root, author).await?;
        }
        if target_author != source_author {
            self.finish_entry_change(root, target_author).await?;
        } else {
            self.notifier.refresh(&[root.to_path_buf()]);
        }
        Ok(removal)
    }

    async fn finish_entry_change(&mut self, root: &Path, author: Option<String>) -> Result<(), ApiError> {
        if let Some(author) = author {
            self.persist(root, &author).await?;
        }
        self.notifier.refresh(&[root.to_path_buf()]);
        Ok(())
    }

    /// Save `author`'s file for `root`. The in-memory view is written as-is
    /// only when the author's record is active; otherwise, including when no
    /// record exists yet, any copy on disk is merged in.
    pub async fn save(&self, root: &Path, author: &str) -> Result<SaveOutcome, ApiError> {
        let state = self
            .states
            .get(root)
            .ok_or_else(|| ApiError::UnknownRoot(root.to_path_buf()))?;
        let active = self
            .records
            .iter()
            .find(|r| r.root_path == root && r.author == author)
            .is_some_and(|r| r.active);
        self.store.save(state, author, active).await
    }

    /// Save after a change, registering the author's record on first write.
    ///
    /// A file that appeared on disk after the root was opened is loaded into
    /// the view first, so later authoritative saves keep its content.
    async fn persist(&mut self, root: &Path, author: &str) -> Result<SaveOutcome, ApiError> {
        let known = self
            .records
            .iter()
            .any(|r| r.root_path == root && r.author == author);
        if !known {
            let file = self.store.config_file(root, author);
            if self.store.storage().exists(&file).await? {
                let record = self.new_record(root, author, file);
                let set = self.store.load(&record).await?;
                self.state_for(root)?.apply_loaded(&set);
                info!(file = %record.file.display(), "Loaded annotation file created outside this session");
                self.records.push(record);
            }
        }

        let outcome = self.save(root, author).await?;
        if let SaveOutcome::Written(file) = &outcome {
            let known = self
                .records
                .iter()
                .any(|r| r.root_path == root && r.author == author);
            if !known {
                let record = self.new_record(root, author, file.clone());
                self.records.push(record);
            }
        }
        Ok(outcome)
    }

    fn new_record(&self, root: &Path, author: &str, file: PathBuf) -> ConfigRecord {
        let root_label = self
            .resolver
            .root(root)
            .map(|r| r.label.clone())
            .unwrap_or_default();
        ConfigRecord {
            file,
            author: author.to_string(),
            root_path: root.to_path_buf(),
            root_label,
            active: true,
        }
    }

    fn state_for(&mut self, root: &Path) -> Result<&mut WorkspaceRootState, ApiError> {
        self.states
            .get_mut(root)
            .ok_or_else(|| ApiError::UnknownRoot(root.to_path_buf()))
    }
}

fn entry_author(entry: Option<&Entry>) -> Option<String> {
    entry.map(|e| e.author().to_string())
}

fn canonical_or_lexical(path: &Path) -> PathBuf {
    canonicalize_root(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Cannot canonicalize root; using it as given");
        lexical_normalize(path)
    })
}
