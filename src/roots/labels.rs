//! Collision-free display labels for workspace roots.
//!
//! Every root starts with its basename. Roots whose labels collide take one more
//! parent segment into the label, and only that group is re-checked, until the
//! group is unique or no member has segments left.

use crate::roots::path::basename;
use crate::roots::WorkspaceRoot;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Assign labels to `root_paths`, preserving input order.
pub fn assign_labels(root_paths: &[PathBuf]) -> Vec<WorkspaceRoot> {
    let mut labels: Vec<String> = root_paths.iter().map(|p| basename(p)).collect();
    let mut remaining: Vec<PathBuf> = root_paths
        .iter()
        .map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default())
        .collect();

    let everyone: Vec<usize> = (0..root_paths.len()).collect();
    for group in colliding_groups(&labels, &everyone) {
        disambiguate(&mut labels, &mut remaining, &group);
    }

    root_paths
        .iter()
        .zip(labels)
        .map(|(path, label)| {
            let degraded = label.is_empty();
            if degraded {
                warn!(
                    root = %path.display(),
                    "Workspace root has an empty label (filesystem root?); display paths will be unprefixed"
                );
            }
            WorkspaceRoot {
                path: path.clone(),
                label,
                degraded,
            }
        })
        .collect()
}

/// Groups (by index) of members sharing a label, in label order.
fn colliding_groups(labels: &[String], members: &[usize]) -> Vec<Vec<usize>> {
    let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &i in members {
        by_label.entry(labels[i].as_str()).or_default().push(i);
    }
    by_label
        .into_values()
        .filter(|group| group.len() > 1)
        .collect()
}

fn disambiguate(labels: &mut [String], remaining: &mut [PathBuf], group: &[usize]) {
    let mut progressed = false;
    for &i in group {
        let segment = basename(&remaining[i]);
        if segment.is_empty() {
            continue;
        }
        labels[i] = Path::new(&segment)
            .join(&labels[i])
            .to_string_lossy()
            .into_owned();
        remaining[i] = remaining[i]
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        progressed = true;
    }

    if !progressed {
        debug!(?group, "Label collision cannot be resolved further");
        return;
    }

    for sub_group in colliding_groups(labels, group) {
        disambiguate(labels, remaining, &sub_group);
    }
}
