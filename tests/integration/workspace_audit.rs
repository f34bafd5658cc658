//! Whole-file audit marking with parent propagation on a real directory tree

use super::test_utils::{canonical, fs_orchestrator, workspace_with_files};
use std::path::{Path, PathBuf};

#[tokio::test]
async fn test_directory_propagation_end_to_end() {
    let temp_dir = workspace_with_files(&["src/a.ts", "src/b.ts", "README.md"]);
    let root = canonical(temp_dir.path());
    let mut orch = fs_orchestrator("alice");
    orch.handle_roots_changed(&[root.clone()], &[]).await.unwrap();

    orch.handle_toggle_audited(&root.join("src/a.ts")).await.unwrap();
    let state = orch.state(&root).unwrap();
    assert!(state.is_audited(Path::new("src/a.ts")));
    assert!(!state.is_audited(Path::new("src")));

    let toggles = orch.handle_toggle_audited(&root.join("src/b.ts")).await.unwrap();
    assert_eq!(
        toggles[0].outcome.affected,
        vec![root.join("src/b.ts"), root.join("src")]
    );
    assert!(orch.state(&root).unwrap().is_audited(Path::new("src")));

    orch.handle_toggle_audited(&root.join("src/a.ts")).await.unwrap();
    let state = orch.state(&root).unwrap();
    assert!(!state.is_audited(Path::new("src")));
    assert!(!state.is_audited(Path::new("src/a.ts")));
    assert!(state.is_audited(Path::new("src/b.ts")));
}

#[tokio::test]
async fn test_audit_state_survives_reopen() {
    let temp_dir = workspace_with_files(&["lib/x.rs", "lib/y.rs"]);
    let root = canonical(temp_dir.path());

    let mut orch = fs_orchestrator("alice");
    orch.handle_roots_changed(&[root.clone()], &[]).await.unwrap();
    orch.handle_toggle_audited(&root.join("lib/x.rs")).await.unwrap();
    assert!(root.join(".vscode/alice.weaudit").exists());
    assert!(root.join(".vscode/.weauditdaylog").exists());

    let mut reopened = fs_orchestrator("alice");
    reopened.handle_roots_changed(&[root.clone()], &[]).await.unwrap();
    let state = reopened.state(&root).unwrap();
    assert!(state.is_audited(Path::new("lib/x.rs")));
    assert!(!state.is_audited(Path::new("lib/y.rs")));
    assert_eq!(reopened.day_log(&root).unwrap().total_files(), 1);
}

#[tokio::test]
async fn test_other_authors_not_loaded_until_toggled() {
    let temp_dir = workspace_with_files(&["a.rs"]);
    let root = canonical(temp_dir.path());

    let mut bob = fs_orchestrator("bob");
    bob.handle_roots_changed(&[root.clone()], &[]).await.unwrap();
    bob.handle_toggle_audited(&root.join("a.rs")).await.unwrap();

    let mut alice = fs_orchestrator("alice");
    alice.handle_roots_changed(&[root.clone()], &[]).await.unwrap();
    assert!(!alice.state(&root).unwrap().is_audited(Path::new("a.rs")));

    let bob_file: PathBuf = root.join(".vscode/bob.weaudit");
    assert!(alice.records().iter().any(|r| r.file == bob_file && !r.active));
    assert!(alice.toggle_record(&bob_file).await.unwrap());
    assert!(alice.state(&root).unwrap().is_audited(Path::new("a.rs")));

    assert!(!alice.toggle_record(&bob_file).await.unwrap());
    assert!(!alice.state(&root).unwrap().is_audited(Path::new("a.rs")));
}
