use coaudit::reconcile::{merge_entries, merge_regions, same_entry};
use coaudit::types::{Entry, EntryDetails, EntryKind, Location, Region};
use proptest::prelude::*;

fn entry() -> impl Strategy<Value = Entry> {
    (
        prop::bool::ANY,
        prop::sample::select(vec!["alice", "bob"]),
        prop::sample::select(vec!["Overflow", "Reentrancy", "Todo"]),
        prop::collection::vec((0u32..50, 0u32..5), 1..3),
    )
        .prop_map(|(finding, author, label, spans)| {
            let kind = if finding { EntryKind::Finding } else { EntryKind::Note };
            let locations = spans
                .into_iter()
                .map(|(start, len)| Location::new("src/lib.rs", "/proj", start, start + len))
                .collect();
            Entry::new(kind, author, label, EntryDetails::default(), locations)
        })
}

proptest! {
    #[test]
    fn prop_merge_keeps_primary_and_covers_secondary(
        primary in prop::collection::vec(entry(), 0..6),
        secondary in prop::collection::vec(entry(), 0..6),
    ) {
        let primary_before = primary.clone();
        let secondary_before = secondary.clone();

        let merged = merge_entries(&primary, &secondary);

        prop_assert_eq!(&primary, &primary_before);
        prop_assert_eq!(&secondary, &secondary_before);
        prop_assert_eq!(&merged[..primary.len()], &primary[..]);
        prop_assert!(merged.len() <= primary.len() + secondary.len());
        for e in &secondary {
            prop_assert!(merged.iter().any(|m| same_entry(m, e)));
        }
    }

    #[test]
    fn prop_merge_with_self_is_identity(entries in prop::collection::vec(entry(), 0..6)) {
        prop_assert_eq!(merge_entries(&entries, &entries), entries);
    }

    #[test]
    fn prop_region_merge_dedups_exact(spans in prop::collection::vec((0u32..30, 0u32..30), 0..8)) {
        let regions: Vec<Region> = spans
            .into_iter()
            .map(|(s, e)| Region::new("a.rs", "alice", s, e))
            .collect();
        let merged = merge_regions(&[], &regions);
        for (i, a) in merged.iter().enumerate() {
            prop_assert!(merged.iter().skip(i + 1).all(|b| a != b));
        }
        prop_assert!(regions.iter().all(|r| merged.contains(r)));
    }
}
