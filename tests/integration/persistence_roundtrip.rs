//! Persisted document shape, load validation and save merging

use super::test_utils::entry;
use coaudit::config::StorageConfig;
use coaudit::error::ApiError;
use coaudit::roots::WorkspaceRoot;
use coaudit::store::{AnnotationStorage, AnnotationStore, MemoryStorage, SaveOutcome};
use coaudit::types::EntryKind;
use coaudit::workspace::{MemorySiblingLister, WorkspaceRootState};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn root() -> WorkspaceRoot {
    WorkspaceRoot {
        path: PathBuf::from("/proj"),
        label: "proj".to_string(),
        degraded: false,
    }
}

fn state(author: &str) -> WorkspaceRootState {
    WorkspaceRootState::new(root(), author, Arc::new(MemorySiblingLister::new()))
}

const WITHOUT_REGIONS: &str = r#"{
    "clientRemote": "",
    "gitRemote": "",
    "gitSha": "",
    "treeEntries": [{
        "label": "Reentrancy",
        "entryType": "finding",
        "author": "alice",
        "details": { "severity": "High" },
        "locations": [{ "path": "src/vault.rs", "startLine": 10, "endLine": 14, "label": "", "description": "" }]
    }],
    "auditedFiles": [{ "path": "src/lib.rs", "author": "alice" }],
    "resolvedEntries": []
}"#;

#[tokio::test]
async fn test_document_without_regions_loads_and_saves_full_shape() {
    let storage = MemoryStorage::new();
    storage.insert("/proj/.vscode/alice.weaudit", WITHOUT_REGIONS);
    let store = AnnotationStore::new(storage, StorageConfig::default());

    let records = store.discover(&root()).await.unwrap();
    let set = store.load(&records[0]).await.unwrap();
    assert_eq!(set.entries.len(), 1);
    assert!(set.resolved.is_empty());
    assert!(set.regions.is_empty());

    let mut s = state("alice");
    s.apply_loaded(&set);
    store.save(&s, "alice", true).await.unwrap();

    let text = store
        .storage()
        .read_to_string(Path::new("/proj/.vscode/alice.weaudit"))
        .await
        .unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    for field in [
        "clientRemote",
        "gitRemote",
        "gitSha",
        "treeEntries",
        "auditedFiles",
        "partiallyAuditedFiles",
        "resolvedEntries",
    ] {
        assert!(doc.get(field).is_some(), "missing {field}");
    }
    assert_eq!(doc["treeEntries"][0]["entryType"], "finding");
    assert_eq!(doc["treeEntries"][0]["details"]["severity"], "High");
}

#[tokio::test]
async fn test_missing_resolved_entries_rejects_load() {
    let storage = MemoryStorage::new();
    storage.insert(
        "/proj/.vscode/alice.weaudit",
        r#"{"treeEntries": [], "auditedFiles": []}"#,
    );
    let store = AnnotationStore::new(storage, StorageConfig::default());

    let records = store.discover(&root()).await.unwrap();
    let err = store.load(&records[0]).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidAnnotations { .. }));
}

#[tokio::test]
async fn test_inactive_save_preserves_disk_edits() {
    let storage = MemoryStorage::new();
    storage.insert("/proj/.vscode/alice.weaudit", WITHOUT_REGIONS);
    let store = AnnotationStore::new(storage, StorageConfig::default());

    let mut s = state("alice");
    s.add_entry(entry(EntryKind::Note, "alice", "New note", "/proj", &[("src/a.rs", 0, 0)]));
    store.save(&s, "alice", false).await.unwrap();

    let records = store.discover(&root()).await.unwrap();
    let set = store.load(&records[0]).await.unwrap();
    let labels: Vec<&str> = set.entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["New note", "Reentrancy"]);
    assert_eq!(set.audited.len(), 1);
}

#[tokio::test]
async fn test_active_save_is_authoritative() {
    let storage = MemoryStorage::new();
    storage.insert("/proj/.vscode/alice.weaudit", WITHOUT_REGIONS);
    let store = AnnotationStore::new(storage, StorageConfig::default());

    let outcome = store.save(&state("alice"), "alice", true).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Written(_)));

    let records = store.discover(&root()).await.unwrap();
    let set = store.load(&records[0]).await.unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_bad_region_record_rejects_whole_file() {
    let storage = MemoryStorage::new();
    storage.insert(
        "/proj/.vscode/bob.weaudit",
        r#"{"treeEntries": [], "auditedFiles": [], "resolvedEntries": [],
            "partiallyAuditedFiles": [{"path": "a.rs", "author": "bob", "startLine": 1}]}"#,
    );
    let store = AnnotationStore::new(storage, StorageConfig::default());
    let records = store.discover(&root()).await.unwrap();
    assert!(matches!(
        store.load(&records[0]).await,
        Err(ApiError::InvalidAnnotations { .. })
    ));
}

#[tokio::test]
async fn test_custom_storage_layout() {
    let layout = StorageConfig {
        dir: ".audit".to_string(),
        extension: "notes".to_string(),
        day_log: "days.json".to_string(),
    };
    let store = AnnotationStore::new(MemoryStorage::new(), layout);
    let mut s = state("alice");
    s.add_entry(entry(EntryKind::Note, "alice", "N", "/proj", &[("a.rs", 0, 0)]));
    let outcome = store.save(&s, "alice", true).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Written(PathBuf::from("/proj/.audit/alice.notes")));
    assert_eq!(store.day_log_file(Path::new("/proj")), PathBuf::from("/proj/.audit/days.json"));
}
