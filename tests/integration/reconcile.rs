//! Entry reconciler: merging in-memory and on-disk annotation sets

use super::test_utils::entry;
use coaudit::reconcile::{merge_entries, merge_sets, same_entry};
use coaudit::types::{AnnotationSet, AuditedFile, EntryKind, Region, RemoteInfo};

#[test]
fn test_location_text_does_not_affect_identity() {
    let a = entry(EntryKind::Finding, "alice", "Overflow", "/proj", &[("a.rs", 1, 2)]);
    let mut b = a.clone();
    b.locations[0].label = "edited".to_string();
    b.locations[0].description = "more context".to_string();
    assert!(same_entry(&a, &b));

    let mut c = a.clone();
    c.locations[0].end_line = 3;
    assert!(!same_entry(&a, &c));
}

#[test]
fn test_location_order_is_ignored() {
    let a = entry(EntryKind::Note, "alice", "N", "/proj", &[("a.rs", 1, 2), ("b.rs", 5, 6)]);
    let b = entry(EntryKind::Note, "alice", "N", "/proj", &[("b.rs", 5, 6), ("a.rs", 1, 2)]);
    assert!(same_entry(&a, &b));
}

#[test]
fn test_merge_keeps_both_sides_without_mutating() {
    let local = vec![
        entry(EntryKind::Finding, "alice", "A", "/proj", &[("a.rs", 1, 2)]),
        entry(EntryKind::Finding, "alice", "B", "/proj", &[("b.rs", 1, 2)]),
    ];
    let disk = vec![
        entry(EntryKind::Finding, "alice", "B", "/proj", &[("b.rs", 1, 2)]),
        entry(EntryKind::Note, "alice", "C", "/proj", &[("c.rs", 4, 4)]),
    ];
    let local_before = local.clone();
    let disk_before = disk.clone();

    let merged = merge_entries(&local, &disk);
    let labels: Vec<&str> = merged.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B", "C"]);
    assert_eq!(local, local_before);
    assert_eq!(disk, disk_before);
}

#[test]
fn test_merge_sets_covers_every_collection() {
    let local = AnnotationSet {
        remote: RemoteInfo::default(),
        entries: vec![entry(EntryKind::Finding, "alice", "A", "/proj", &[("a.rs", 1, 2)])],
        audited: vec![AuditedFile::new("a.rs", "alice")],
        regions: vec![Region::new("c.rs", "alice", 0, 3)],
        ..AnnotationSet::default()
    };
    let disk = AnnotationSet {
        remote: RemoteInfo {
            git_remote: "git@example.com:org/repo.git".to_string(),
            ..RemoteInfo::default()
        },
        resolved: vec![entry(EntryKind::Note, "alice", "Old", "/proj", &[("d.rs", 0, 0)])],
        audited: vec![AuditedFile::new("a.rs", "alice"), AuditedFile::new("b.rs", "alice")],
        regions: vec![Region::new("c.rs", "alice", 0, 3), Region::new("c.rs", "alice", 9, 9)],
        ..AnnotationSet::default()
    };

    let merged = merge_sets(&local, &disk);
    assert_eq!(merged.remote.git_remote, "git@example.com:org/repo.git");
    assert_eq!(merged.entries.len(), 1);
    assert_eq!(merged.resolved.len(), 1);
    assert_eq!(merged.audited.len(), 2);
    assert_eq!(merged.regions.len(), 2);
}
