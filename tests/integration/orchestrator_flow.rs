//! Orchestrator flows over in-memory storage: nested roots, region marks,
//! entry routing and concurrent saves

use super::test_utils::{entry, memory_orchestrator};
use coaudit::store::{AnnotationStorage, MemoryStorage, SaveOutcome};
use coaudit::types::{EntryDetails, EntryKind, Selection};
use coaudit::views::{TreeMode, TreeNode, ViewPolicy};
use coaudit::workspace::MemorySiblingLister;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn nested_lister() -> MemorySiblingLister {
    MemorySiblingLister::with_files(Path::new("/proj"), &["sub/x.ts", "sub/y.ts", "z.ts"])
}

#[tokio::test]
async fn test_ambiguous_toggle_marks_everywhere_then_unmarks_everywhere() {
    let mut orch = memory_orchestrator("alice", MemoryStorage::new(), nested_lister());
    orch.handle_roots_changed(&[PathBuf::from("/proj"), PathBuf::from("/proj/sub")], &[])
        .await
        .unwrap();

    let target = Path::new("/proj/sub/x.ts");
    let toggles = orch.handle_toggle_audited(target).await.unwrap();
    assert_eq!(toggles.len(), 2);
    assert!(toggles.iter().all(|t| t.outcome.audited));
    assert!(orch.state(Path::new("/proj")).unwrap().is_audited(Path::new("sub/x.ts")));
    assert!(orch.state(Path::new("/proj/sub")).unwrap().is_audited(Path::new("x.ts")));

    let toggles = orch.handle_toggle_audited(target).await.unwrap();
    assert_eq!(toggles.len(), 2);
    assert!(toggles.iter().all(|t| !t.outcome.audited));
}

#[tokio::test]
async fn test_ambiguous_toggle_unmarks_only_where_marked() {
    let mut orch = memory_orchestrator("alice", MemoryStorage::new(), nested_lister());
    orch.handle_roots_changed(&[PathBuf::from("/proj"), PathBuf::from("/proj/sub")], &[])
        .await
        .unwrap();

    let target = Path::new("/proj/sub/x.ts");
    orch.state_mut(Path::new("/proj/sub"))
        .unwrap()
        .mark_audited(target)
        .unwrap();

    let toggles = orch.handle_toggle_audited(target).await.unwrap();
    assert_eq!(toggles.len(), 1);
    assert_eq!(toggles[0].root, PathBuf::from("/proj/sub"));
    assert!(!toggles[0].outcome.audited);
}

#[tokio::test]
async fn test_region_mark_uses_innermost_root_and_persists() {
    let mut orch = memory_orchestrator("alice", MemoryStorage::new(), nested_lister());
    orch.handle_roots_changed(&[PathBuf::from("/proj"), PathBuf::from("/proj/sub")], &[])
        .await
        .unwrap();

    let changed = orch
        .handle_region_mark(&[
            Selection::new("/proj/sub/x.ts", 10, 20),
            Selection::new("/proj/sub/x.ts", 15, 25),
            Selection::new("/proj/z.ts", 0, 0),
        ])
        .await
        .unwrap();
    assert_eq!(changed.len(), 2);

    let inner = orch.state(Path::new("/proj/sub")).unwrap();
    let spans: Vec<(u32, u32)> = inner
        .regions_for(Path::new("x.ts"))
        .map(|r| (r.start_line, r.end_line))
        .collect();
    assert_eq!(spans, vec![(10, 25)]);
    assert_eq!(orch.state(Path::new("/proj")).unwrap().regions().len(), 1);

    let text = orch
        .store()
        .storage()
        .read_to_string(Path::new("/proj/sub/.vscode/alice.weaudit"))
        .await
        .unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["partiallyAuditedFiles"][0]["startLine"], 10);
    assert_eq!(doc["partiallyAuditedFiles"][0]["endLine"], 25);
}

#[tokio::test]
async fn test_region_mark_outside_roots_changes_nothing() {
    let mut orch = memory_orchestrator("alice", MemoryStorage::new(), nested_lister());
    orch.handle_roots_changed(&[PathBuf::from("/proj")], &[]).await.unwrap();

    let result = orch
        .handle_region_mark(&[
            Selection::new("/proj/z.ts", 0, 3),
            Selection::new("/elsewhere/a.ts", 0, 3),
        ])
        .await;
    assert!(result.is_err());
    assert!(orch.state(Path::new("/proj")).unwrap().regions().is_empty());
}

#[tokio::test]
async fn test_edit_of_other_authors_entry_saves_their_file() {
    let storage = MemoryStorage::new();
    storage.insert(
        "/proj/.vscode/bob.weaudit",
        r#"{"treeEntries": [{"label": "Bob's finding", "entryType": "finding", "author": "bob",
              "details": {}, "locations": [{"path": "z.ts", "startLine": 1, "endLine": 2, "label": "", "description": ""}]}],
            "auditedFiles": [], "resolvedEntries": []}"#,
    );
    let mut orch = memory_orchestrator("alice", storage, nested_lister());
    orch.handle_roots_changed(&[PathBuf::from("/proj")], &[]).await.unwrap();
    orch.toggle_record(Path::new("/proj/.vscode/bob.weaudit"))
        .await
        .unwrap();

    let root = PathBuf::from("/proj");
    let (id, _) = orch
        .state(&root)
        .unwrap()
        .entries()
        .find(|(_, e)| e.author() == "bob")
        .unwrap();
    orch.handle_resolve_entry(&root, id).await.unwrap();

    let text = orch
        .store()
        .storage()
        .read_to_string(Path::new("/proj/.vscode/bob.weaudit"))
        .await
        .unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["treeEntries"].as_array().unwrap().len(), 0);
    assert_eq!(doc["resolvedEntries"][0]["label"], "Bob's finding");
    assert!(orch
        .store()
        .storage()
        .get(Path::new("/proj/.vscode/alice.weaudit"))
        .is_none());
}

#[tokio::test]
async fn test_concurrent_saves() {
    let mut orch = memory_orchestrator("alice", MemoryStorage::new(), nested_lister());
    orch.handle_roots_changed(&[PathBuf::from("/proj")], &[]).await.unwrap();
    let root = PathBuf::from("/proj");
    {
        let state = orch.state_mut(&root).unwrap();
        state.add_entry(entry(EntryKind::Finding, "alice", "A", "/proj", &[("z.ts", 0, 1)]));
        state.add_entry(entry(EntryKind::Note, "bob", "B", "/proj", &[("z.ts", 4, 4)]));
    }

    let (a1, a2, b) = tokio::join!(
        orch.save(&root, "alice"),
        orch.save(&root, "alice"),
        orch.save(&root, "bob")
    );
    assert!(matches!(a1.unwrap(), SaveOutcome::Written(_)));
    assert!(matches!(a2.unwrap(), SaveOutcome::Written(_)));
    assert!(matches!(b.unwrap(), SaveOutcome::Written(_)));

    let storage = orch.store().storage();
    for author in ["alice", "bob"] {
        let text = storage
            .get(&PathBuf::from(format!("/proj/.vscode/{author}.weaudit")))
            .unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["treeEntries"].as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_multi_root_tree_uses_label_prefixed_paths() {
    let lister = MemorySiblingLister::new();
    let mut orch = memory_orchestrator("alice", MemoryStorage::new(), lister);
    orch.handle_roots_changed(&[PathBuf::from("/work/a/api"), PathBuf::from("/work/b/api")], &[])
        .await
        .unwrap();

    let labels: Vec<String> = orch.roots().iter().map(|r| r.label.clone()).collect();
    assert_ne!(labels[0], labels[1]);

    orch.handle_add_entry(
        EntryKind::Finding,
        "Injection",
        EntryDetails::default(),
        &[Selection::new("/work/b/api/handler.rs", 7, 9)],
    )
    .await
    .unwrap();

    let tree = orch.tree(&ViewPolicy::new(TreeMode::ByFile));
    let TreeNode::PathGroup(group) = &tree[0] else {
        panic!("expected path group");
    };
    assert_eq!(group.display_path, Path::new(&labels[1]).join("handler.rs"));

    orch.handle_roots_changed(&[], &[PathBuf::from("/work/a/api")])
        .await
        .unwrap();
    assert_eq!(orch.roots()[0].label, "api");
    let tree = orch.tree(&ViewPolicy::new(TreeMode::ByFile));
    let TreeNode::PathGroup(group) = &tree[0] else {
        panic!("expected path group");
    };
    assert_eq!(group.display_path, PathBuf::from("handler.rs"));
}
