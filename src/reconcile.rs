//! Entry Reconciler
//!
//! Merges two independently edited annotation collections (typically the
//! in-memory view and the last persisted file of the same author) without
//! losing either side. Inputs are borrowed immutably and every merge returns a
//! fresh collection, so either side may still be iterated elsewhere while the
//! merge runs.

use crate::types::{AnnotationSet, AuditedFile, Entry, Region, RemoteInfo};
use std::path::Path;

/// Structural equality: kind, author, label and the same multiset of location
/// spans. Location labels and descriptions are cosmetic and ignored.
pub fn same_entry(a: &Entry, b: &Entry) -> bool {
    if a.kind() != b.kind() || a.author() != b.author() || a.label != b.label {
        return false;
    }
    if a.locations.len() != b.locations.len() {
        return false;
    }
    let mut left: Vec<(&Path, u32, u32)> = a.locations.iter().map(|l| l.span_key()).collect();
    let mut right: Vec<(&Path, u32, u32)> = b.locations.iter().map(|l| l.span_key()).collect();
    left.sort();
    right.sort();
    left == right
}

/// All of `primary`, then every element of `secondary` with no structural
/// match in the output so far.
pub fn merge_entries(primary: &[Entry], secondary: &[Entry]) -> Vec<Entry> {
    merge_by(primary, secondary, same_entry)
}

/// Merge audited-file markers by `(path, author)`.
pub fn merge_audited_files(primary: &[AuditedFile], secondary: &[AuditedFile]) -> Vec<AuditedFile> {
    merge_by(primary, secondary, |a, b| a == b)
}

/// Merge partially audited regions by exact `(path, author, start, end)`.
///
/// No interval coalescing happens here; run the region engine's normalization
/// separately when needed.
pub fn merge_regions(primary: &[Region], secondary: &[Region]) -> Vec<Region> {
    merge_by(primary, secondary, |a, b| a == b)
}

/// Merge two whole annotation sets. Remote info comes from `primary` unless it
/// is empty.
pub fn merge_sets(primary: &AnnotationSet, secondary: &AnnotationSet) -> AnnotationSet {
    AnnotationSet {
        remote: merge_remote(&primary.remote, &secondary.remote),
        entries: merge_entries(&primary.entries, &secondary.entries),
        resolved: merge_entries(&primary.resolved, &secondary.resolved),
        audited: merge_audited_files(&primary.audited, &secondary.audited),
        regions: merge_regions(&primary.regions, &secondary.regions),
    }
}

fn merge_remote(primary: &RemoteInfo, secondary: &RemoteInfo) -> RemoteInfo {
    let pick = |a: &String, b: &String| if a.is_empty() { b.clone() } else { a.clone() };
    RemoteInfo {
        client_remote: pick(&primary.client_remote, &secondary.client_remote),
        git_remote: pick(&primary.git_remote, &secondary.git_remote),
        git_sha: pick(&primary.git_sha, &secondary.git_sha),
    }
}

fn merge_by<T: Clone>(primary: &[T], secondary: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<T> {
    let mut out: Vec<T> = primary.to_vec();
    for candidate in secondary {
        if !out.iter().any(|existing| eq(existing, candidate)) {
            out.push(candidate.clone());
        }
    }
    out
}
