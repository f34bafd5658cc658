//! CLI route table driven end to end against a temporary workspace

use super::test_utils::{canonical, workspace_with_files};
use clap::Parser;
use coaudit::cli::{Cli, RunContext};
use std::path::Path;

async fn run(root: &Path, args: &[&str]) -> Result<String, coaudit::error::ApiError> {
    let mut argv = vec!["coaudit", "--root", root.to_str().unwrap(), "--author", "alice"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let mut context = RunContext::new(cli.roots.clone(), cli.config.clone(), cli.author.clone()).await?;
    context.execute(&cli.command).await
}

#[tokio::test]
async fn test_audit_show_and_daylog() {
    let temp_dir = workspace_with_files(&["src/a.rs", "src/b.rs"]);
    let root = canonical(temp_dir.path());
    let a = root.join("src/a.rs");

    let out = run(&root, &["audit", a.to_str().unwrap()]).await.unwrap();
    assert!(out.contains("a.rs"));
    assert!(root.join(".vscode/alice.weaudit").exists());

    let out = run(&root, &["daylog"]).await.unwrap();
    assert!(out.contains("src/a.rs"));

    let out = run(&root, &["add", "finding", "Overflow", a.to_str().unwrap(), "3:5", "--severity", "High"])
        .await
        .unwrap();
    assert!(out.contains("Overflow"));

    let out = run(&root, &["show"]).await.unwrap();
    assert!(out.contains("Overflow"));
    assert!(out.contains("src/a.rs:3-5"));
}

#[tokio::test]
async fn test_mark_reports_one_based_regions() {
    let temp_dir = workspace_with_files(&["lib.rs"]);
    let root = canonical(temp_dir.path());
    let file = root.join("lib.rs");

    let out = run(&root, &["mark", file.to_str().unwrap(), "11:21", "16:26"]).await.unwrap();
    assert!(out.contains("11-26"), "unexpected output: {out}");

    let out = run(&root, &["mark", file.to_str().unwrap(), "11:26"]).await.unwrap();
    assert!(out.contains("no partially audited regions"));
}

#[tokio::test]
async fn test_validate_and_merge() {
    let temp_dir = workspace_with_files(&["a.rs"]);
    let root = canonical(temp_dir.path());
    let vscode = root.join(".vscode");
    std::fs::create_dir_all(&vscode).unwrap();
    std::fs::write(
        vscode.join("bob.weaudit"),
        r#"{"treeEntries": [], "auditedFiles": [{"path": "a.rs", "author": "bob"}], "resolvedEntries": []}"#,
    )
    .unwrap();
    std::fs::write(
        vscode.join("carol.weaudit"),
        r#"{"treeEntries": [], "auditedFiles": [{"path": "a.rs", "author": "bob"}, {"path": "b.rs", "author": "bob"}], "resolvedEntries": []}"#,
    )
    .unwrap();
    std::fs::write(vscode.join("broken.weaudit"), r#"{"auditedFiles": []}"#).unwrap();

    let out = run(
        &root,
        &[
            "validate",
            vscode.join("bob.weaudit").to_str().unwrap(),
            vscode.join("broken.weaudit").to_str().unwrap(),
        ],
    )
    .await
    .unwrap();
    assert!(out.contains("2 file(s) checked, 1 invalid"));

    let merged = root.join("merged.weaudit");
    run(
        &root,
        &[
            "merge",
            vscode.join("bob.weaudit").to_str().unwrap(),
            vscode.join("carol.weaudit").to_str().unwrap(),
            "--out",
            merged.to_str().unwrap(),
        ],
    )
    .await
    .unwrap();
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&merged).unwrap()).unwrap();
    assert_eq!(doc["auditedFiles"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_classify_outside_root() {
    let temp_dir = workspace_with_files(&["a.rs"]);
    let root = canonical(temp_dir.path());
    let out = run(&root, &["classify", "/definitely/not/here.rs"]).await.unwrap();
    assert!(out.contains("not inside any workspace root"));

    let err = run(&root, &["audit", "/definitely/not/here.rs"]).await.unwrap_err();
    assert!(matches!(err, coaudit::error::ApiError::PathOutsideRoots(_)));
}
