use coaudit::roots::assign_labels;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::PathBuf;

fn segment() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["api", "web", "core", "a", "b"]).prop_map(str::to_string)
}

fn root_paths() -> impl Strategy<Value = Vec<PathBuf>> {
    prop::collection::btree_set(prop::collection::vec(segment(), 3), 1..8).prop_map(|set| {
        set.into_iter()
            .map(|segments| PathBuf::from(format!("/{}", segments.join("/"))))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_labels_unique_and_suffix_of_path(paths in root_paths()) {
        let roots = assign_labels(&paths);
        prop_assert_eq!(roots.len(), paths.len());

        let labels: BTreeSet<&str> = roots.iter().map(|r| r.label.as_str()).collect();
        prop_assert_eq!(labels.len(), roots.len());

        for (root, path) in roots.iter().zip(&paths) {
            prop_assert_eq!(&root.path, path);
            prop_assert!(!root.degraded);
            prop_assert!(path.ends_with(&root.label));
        }
    }

    #[test]
    fn prop_labels_independent_of_order(paths in root_paths()) {
        let forward = assign_labels(&paths);
        let mut reversed_paths = paths.clone();
        reversed_paths.reverse();
        let mut backward = assign_labels(&reversed_paths);
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }
}
