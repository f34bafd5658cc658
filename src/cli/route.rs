//! CLI route: single route table and run context. Dispatches to the
//! orchestrator and presentation.

use crate::cli::command_name;
use crate::cli::parse::{Commands, KindArg, LineSpan};
use crate::cli::presentation::{
    format_audit_toggles, format_classification, format_day_logs, format_entry_added,
    format_merge_summary, format_region_mark, format_roots, format_tree,
    format_validation_report, ValidationLine,
};
use crate::config::{CoauditConfig, ConfigLoader};
use crate::error::{ApiError, StorageError};
use crate::orchestrator::{NoopNotifier, Orchestrator};
use crate::reconcile::merge_sets;
use crate::region::normalize;
use crate::roots::path::lexical_normalize;
use crate::store::{parse_document, AnnotationStorage, AnnotationStore, FsStorage, PersistedShape};
use crate::types::{AnnotationSet, EntryDetails, EntryKind, Selection};
use crate::views::{TreeMode, ViewPolicy};
use crate::workspace::FsSiblingLister;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Runtime context for CLI execution: configuration and the orchestrator over
/// the requested roots.
pub struct RunContext {
    config: CoauditConfig,
    orchestrator: Orchestrator<FsStorage>,
}

impl RunContext {
    /// Load configuration, open every root and load the author's files.
    pub async fn new(
        roots: Vec<PathBuf>,
        config_path: Option<PathBuf>,
        author: Option<String>,
    ) -> Result<Self, ApiError> {
        let roots = if roots.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            roots
        };
        let roots = roots
            .iter()
            .map(|r| absolutize(r))
            .collect::<Result<Vec<_>, _>>()?;

        let mut config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&roots[0])?
        };
        if author.is_some() {
            config.author = author;
        }
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(msgs.join("; "))
        })?;

        let author = config.resolve_author();
        let store = AnnotationStore::new(FsStorage, config.storage.clone());
        let mut orchestrator = Orchestrator::new(
            author,
            store,
            Arc::new(FsSiblingLister),
            Arc::new(NoopNotifier),
        );
        orchestrator.handle_roots_changed(&roots, &[]).await?;

        Ok(Self {
            config,
            orchestrator,
        })
    }

    pub fn config(&self) -> &CoauditConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator<FsStorage> {
        &self.orchestrator
    }

    /// Run one command and return its rendered output.
    pub async fn execute(&mut self, command: &Commands) -> Result<String, ApiError> {
        info!(command = command_name(command), author = self.orchestrator.author(), "Running command");
        match command {
            Commands::Labels => Ok(format_roots(self.orchestrator.roots())),
            Commands::Classify { path } => self.handle_classify(path),
            Commands::Audit { paths } => self.handle_audit(paths).await,
            Commands::Mark { path, spans } => self.handle_mark(path, spans).await,
            Commands::Add {
                kind,
                label,
                path,
                span,
                severity,
                difficulty,
                finding_type,
                description,
            } => {
                let details = EntryDetails {
                    severity: severity.clone(),
                    difficulty: difficulty.clone(),
                    finding_type: finding_type.clone(),
                    description: description.clone(),
                    ..EntryDetails::default()
                };
                self.handle_add(*kind, label, path, *span, details).await
            }
            Commands::Show {
                by_file,
                resolved,
                all,
            } => self.handle_show(*by_file, *resolved, *all).await,
            Commands::Validate { files } => self.handle_validate(files).await,
            Commands::Merge {
                primary,
                secondary,
                out,
            } => self.handle_merge(primary, secondary, out.as_deref()).await,
            Commands::Daylog => {
                let logs: Vec<_> = self
                    .orchestrator
                    .roots()
                    .iter()
                    .filter_map(|root| self.orchestrator.day_log(&root.path).map(|log| (root, log)))
                    .collect();
                Ok(format_day_logs(&logs))
            }
        }
    }

    fn handle_classify(&self, path: &Path) -> Result<String, ApiError> {
        let path = absolutize(path)?;
        let classification = self.orchestrator.classify(&path);
        let unique = self.orchestrator.unique_path(&path).ok();
        let containing = self.orchestrator.resolver().classify_all(&path);
        Ok(format_classification(
            &path,
            &classification,
            unique.as_deref(),
            &containing,
        ))
    }

    async fn handle_audit(&mut self, paths: &[PathBuf]) -> Result<String, ApiError> {
        let mut out = Vec::new();
        for path in paths {
            let path = absolutize(path)?;
            let toggles = self.orchestrator.handle_toggle_audited(&path).await?;
            out.push(format_audit_toggles(&path, &toggles));
        }
        Ok(out.join("\n"))
    }

    async fn handle_mark(&mut self, path: &Path, spans: &[LineSpan]) -> Result<String, ApiError> {
        let path = absolutize(path)?;
        let selections: Vec<Selection> = spans
            .iter()
            .map(|s| Selection::new(path.clone(), s.start, s.end))
            .collect();
        let changed = self.orchestrator.handle_region_mark(&selections).await?;

        let classification = self.orchestrator.classify(&path);
        let root = classification
            .root
            .ok_or_else(|| ApiError::PathOutsideRoots(path.clone()))?;
        let author = self.orchestrator.author().to_string();
        let regions: Vec<_> = self
            .orchestrator
            .state(&root.path)
            .map(|state| {
                state
                    .regions_for(&classification.relative_path)
                    .filter(|r| r.author == author)
                    .collect()
            })
            .unwrap_or_default();
        Ok(format_region_mark(&path, &changed, &regions))
    }

    async fn handle_add(
        &mut self,
        kind: KindArg,
        label: &str,
        path: &Path,
        span: LineSpan,
        details: EntryDetails,
    ) -> Result<String, ApiError> {
        let kind = match kind {
            KindArg::Finding => EntryKind::Finding,
            KindArg::Note => EntryKind::Note,
        };
        let selection = Selection::new(absolutize(path)?, span.start, span.end);
        let (root, id) = self
            .orchestrator
            .handle_add_entry(kind, label, details, &[selection])
            .await?;
        let root_label = self
            .orchestrator
            .resolver()
            .root(&root)
            .map(|r| r.label.clone())
            .unwrap_or_default();
        Ok(format_entry_added(kind, id, label, &root_label))
    }

    async fn handle_show(&mut self, by_file: bool, resolved: bool, all: bool) -> Result<String, ApiError> {
        if all {
            let inactive: Vec<PathBuf> = self
                .orchestrator
                .records()
                .iter()
                .filter(|r| !r.active)
                .map(|r| r.file.clone())
                .collect();
            for file in inactive {
                self.orchestrator.toggle_record(&file).await?;
            }
        }

        let mode = if by_file {
            TreeMode::ByFile
        } else {
            TreeMode::ByEntry
        };
        let policy = ViewPolicy {
            resolved,
            ..ViewPolicy::new(mode)
        };
        Ok(format_tree(&self.orchestrator.tree(&policy)))
    }

    async fn handle_validate(&self, files: &[PathBuf]) -> Result<String, ApiError> {
        let storage = self.orchestrator.store().storage();
        let mut lines = Vec::with_capacity(files.len());
        for file in files {
            let outcome = match storage.read_to_string(file).await {
                Ok(text) => parse_document(&text, file)
                    .map(|shape| {
                        (
                            shape.tree_entries.len() + shape.resolved_entries.len(),
                            shape.audited_files.len(),
                            shape.partially_audited_files.len(),
                        )
                    })
                    .map_err(|e| crate::cli::map_error(&e)),
                Err(e) => Err(e.to_string()),
            };
            debug!(file = %file.display(), valid = outcome.is_ok(), "Validated annotation file");
            lines.push(ValidationLine {
                file: file.clone(),
                outcome,
            });
        }
        Ok(format_validation_report(&lines))
    }

    async fn handle_merge(
        &self,
        primary: &Path,
        secondary: &Path,
        out: Option<&Path>,
    ) -> Result<String, ApiError> {
        let primary = self.load_standalone(primary).await?;
        let secondary = self.load_standalone(secondary).await?;
        let mut merged = merge_sets(&primary, &secondary);
        merged.regions = normalize(merged.regions);

        let shape = PersistedShape::from_set(&merged);
        if let Some(out) = out {
            let text = serde_json::to_string_pretty(&shape).map_err(StorageError::from)?;
            self.orchestrator.store().storage().write(out, &text).await?;
            info!(out = %out.display(), "Wrote merged annotation file");
        }
        format_merge_summary(&shape, out).map_err(|e| StorageError::from(e).into())
    }

    /// Load a document that is not tied to an open root. Its root is taken to
    /// be the parent of the storage directory holding it.
    async fn load_standalone(&self, file: &Path) -> Result<AnnotationSet, ApiError> {
        let file = absolutize(file)?;
        let root = file
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.orchestrator.store().load_file(&file, &root).await
    }
}

/// Absolute form of a command-line path; existing paths are canonicalized.
fn absolutize(path: &Path) -> Result<PathBuf, ApiError> {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return Ok(canonical);
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| StorageError::io(path, e))?
            .join(path)
    };
    Ok(lexical_normalize(&joined))
}
