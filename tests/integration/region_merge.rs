//! Region merge engine behaviour over realistic selection sequences

use coaudit::region::{is_normalized, normalize, toggle_region, toggle_regions};
use coaudit::types::Region;

fn sel(path: &str, author: &str, start: u32, end: u32) -> Region {
    Region::new(path, author, start, end)
}

fn spans(regions: &[Region]) -> Vec<(u32, u32)> {
    regions.iter().map(|r| (r.start_line, r.end_line)).collect()
}

#[test]
fn test_overlap_then_exact_unmark() {
    let regions = toggle_region(&[], &sel("a.ts", "alice", 10, 20));
    let regions = toggle_region(&regions, &sel("a.ts", "alice", 15, 25));
    assert_eq!(spans(&regions), vec![(10, 25)]);

    let regions = toggle_region(&regions, &sel("a.ts", "alice", 10, 25));
    assert!(regions.is_empty());
}

#[test]
fn test_interior_selection_splits() {
    let regions = toggle_region(&[], &sel("a.ts", "alice", 0, 30));
    let regions = toggle_region(&regions, &sel("a.ts", "alice", 10, 12));
    assert_eq!(spans(&regions), vec![(0, 9), (13, 30)]);
}

#[test]
fn test_boundary_selection_trims() {
    let regions = vec![sel("a.ts", "alice", 5, 15)];
    assert_eq!(spans(&toggle_region(&regions, &sel("a.ts", "alice", 5, 7))), vec![(8, 15)]);
    assert_eq!(spans(&toggle_region(&regions, &sel("a.ts", "alice", 12, 15))), vec![(5, 11)]);
}

#[test]
fn test_adjacent_selection_coalesces() {
    let regions = toggle_region(&[], &sel("a.ts", "alice", 0, 4));
    let regions = toggle_region(&regions, &sel("a.ts", "alice", 5, 9));
    assert_eq!(spans(&regions), vec![(0, 9)]);
}

#[test]
fn test_selection_covering_several_regions_absorbs_them() {
    let existing = vec![
        sel("a.ts", "alice", 2, 3),
        sel("a.ts", "alice", 8, 9),
        sel("a.ts", "alice", 20, 21),
    ];
    let regions = toggle_region(&existing, &sel("a.ts", "alice", 0, 10));
    assert_eq!(spans(&regions), vec![(0, 10), (20, 21)]);
}

#[test]
fn test_keys_are_independent() {
    let existing = vec![sel("a.ts", "alice", 0, 10), sel("a.ts", "bob", 0, 10)];
    let regions = toggle_region(&existing, &sel("a.ts", "alice", 0, 10));
    assert_eq!(regions, vec![sel("a.ts", "bob", 0, 10)]);

    let regions = toggle_region(&existing, &sel("b.ts", "alice", 0, 10));
    assert_eq!(regions.len(), 3);
}

#[test]
fn test_multi_cursor_selections() {
    let regions = toggle_regions(
        &[sel("a.ts", "alice", 0, 10)],
        &[sel("a.ts", "alice", 3, 4), sel("a.ts", "alice", 30, 31), sel("a.ts", "alice", 32, 33)],
    );
    assert_eq!(spans(&regions), vec![(0, 2), (5, 10), (30, 33)]);
    assert!(is_normalized(&regions));
}

#[test]
fn test_reversed_bounds_are_swapped() {
    let region = sel("a.ts", "alice", 9, 3);
    assert_eq!((region.start_line, region.end_line), (3, 9));
}

#[test]
fn test_normalize_loaded_regions() {
    let regions = normalize(vec![
        sel("a.ts", "alice", 10, 12),
        sel("a.ts", "alice", 0, 4),
        sel("a.ts", "alice", 3, 9),
    ]);
    assert_eq!(spans(&regions), vec![(0, 12)]);
}
