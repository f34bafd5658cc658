//! Region merge engine
//!
//! Toggles "partially audited" line spans for a `(path, author)` key. A selection
//! that falls inside an existing region unmarks that part of it (remove, trim or
//! split); anything else is inserted and the touched keys are normalized so that
//! no two regions of the same key overlap or sit on adjacent lines.

use crate::types::Region;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::trace;

/// What a single selection did to the region set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionEdit {
    /// Exact match; the region was unmarked
    Removed,
    /// Selection shared a boundary with the region; the region was shortened
    Trimmed,
    /// Selection was interior; the region now flanks it on both sides
    Split,
    /// No containing region; the selection was added
    Inserted,
}

/// Toggle one selection against `existing`. Returns a fresh set.
pub fn toggle_region(existing: &[Region], selection: &Region) -> Vec<Region> {
    toggle_regions(existing, std::slice::from_ref(selection))
}

/// Toggle several simultaneous selections (multi-cursor) against `existing`.
///
/// Selections are applied in order against the accumulated set; normalization
/// runs once at the end for every key that received an insert.
pub fn toggle_regions(existing: &[Region], selections: &[Region]) -> Vec<Region> {
    let mut regions = existing.to_vec();
    let mut touched: BTreeSet<(PathBuf, String)> = BTreeSet::new();

    for selection in selections {
        let edit = apply_selection(&mut regions, selection);
        trace!(
            path = %selection.path.display(),
            author = %selection.author,
            start = selection.start_line,
            end = selection.end_line,
            ?edit,
            "Applied region selection"
        );
        if edit == RegionEdit::Inserted {
            touched.insert((selection.path.clone(), selection.author.clone()));
        }
    }

    if touched.is_empty() {
        regions
    } else {
        normalize_keys(regions, &touched)
    }
}

fn apply_selection(regions: &mut Vec<Region>, selection: &Region) -> RegionEdit {
    let Some(idx) = regions
        .iter()
        .position(|r| r.same_key(selection) && r.contains(selection))
    else {
        regions.push(selection.clone());
        return RegionEdit::Inserted;
    };

    let existing = regions[idx].clone();
    let starts_together = existing.start_line == selection.start_line;
    let ends_together = existing.end_line == selection.end_line;

    match (starts_together, ends_together) {
        (true, true) => {
            regions.remove(idx);
            RegionEdit::Removed
        }
        (true, false) => {
            regions[idx].start_line = selection.end_line + 1;
            RegionEdit::Trimmed
        }
        (false, true) => {
            regions[idx].end_line = selection.start_line - 1;
            RegionEdit::Trimmed
        }
        (false, false) => {
            regions[idx].end_line = selection.start_line - 1;
            let tail = Region {
                path: existing.path,
                author: existing.author,
                start_line: selection.end_line + 1,
                end_line: existing.end_line,
            };
            regions.insert(idx + 1, tail);
            RegionEdit::Split
        }
    }
}

/// Normalize every key present in `regions`.
pub fn normalize(regions: Vec<Region>) -> Vec<Region> {
    let keys: BTreeSet<(PathBuf, String)> = regions
        .iter()
        .map(|r| (r.path.clone(), r.author.clone()))
        .collect();
    normalize_keys(regions, &keys)
}

/// Sort and coalesce the regions of the given keys; other regions keep their
/// relative order and come first.
fn normalize_keys(regions: Vec<Region>, keys: &BTreeSet<(PathBuf, String)>) -> Vec<Region> {
    let (mut selected, mut out): (Vec<Region>, Vec<Region>) = regions
        .into_iter()
        .partition(|r| keys.contains(&(r.path.clone(), r.author.clone())));

    selected.sort_by(|a, b| {
        (&a.path, &a.author, a.start_line, a.end_line).cmp(&(
            &b.path,
            &b.author,
            b.start_line,
            b.end_line,
        ))
    });

    let mut merged: Vec<Region> = Vec::with_capacity(selected.len());
    for region in selected {
        match merged.last_mut() {
            Some(last) if last.same_key(&region) && last.touches(&region) => {
                last.end_line = last.end_line.max(region.end_line);
            }
            _ => merged.push(region),
        }
    }

    out.extend(merged);
    out
}

/// True when no two regions of the same key overlap or are adjacent.
pub fn is_normalized(regions: &[Region]) -> bool {
    regions.iter().enumerate().all(|(i, a)| {
        regions
            .iter()
            .skip(i + 1)
            .all(|b| !(a.same_key(b) && a.touches(b)))
    })
}
