//! Tree Views
//!
//! Builds the entry tree shown to users from the per-root states. Nodes are an
//! explicit sum type; locations point at their owning entry by id.

use crate::roots::RootResolver;
use crate::types::{EntryId, EntryKind};
use crate::workspace::WorkspaceRootState;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How entries are grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeMode {
    /// One node per entry with its locations as children
    #[default]
    ByEntry,
    /// One node per file with every location in it as children
    ByFile,
}

/// Entry filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeFilter {
    ByAuthor(String),
    ByKind(EntryKind),
}

/// Tree view policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewPolicy {
    pub mode: TreeMode,
    /// All filters must match
    pub filters: Vec<TreeFilter>,
    /// Show resolved entries instead of active ones
    pub resolved: bool,
}

impl ViewPolicy {
    pub fn new(mode: TreeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Entry(EntryNode),
    Location(LocationNode),
    PathGroup(PathGroupNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryNode {
    pub root: PathBuf,
    pub id: EntryId,
    pub label: String,
    pub kind: EntryKind,
    pub author: String,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNode {
    pub root: PathBuf,
    /// Owning entry
    pub entry: EntryId,
    /// Position in the owning entry's location list
    pub index: usize,
    pub entry_label: String,
    /// Label-prefixed when several roots are open
    pub display_path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGroupNode {
    pub display_path: PathBuf,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Entry(e) => &e.children,
            TreeNode::PathGroup(g) => &g.children,
            TreeNode::Location(_) => &[],
        }
    }
}

/// Build the tree over every root state, in the given order.
pub fn build_tree<'a>(
    states: impl IntoIterator<Item = &'a WorkspaceRootState>,
    resolver: &RootResolver,
    policy: &ViewPolicy,
) -> Vec<TreeNode> {
    let mut entries = Vec::new();

    for state in states {
        let root = state.root();
        let listed: Vec<_> = if policy.resolved {
            state.resolved_entries().collect()
        } else {
            state.entries().collect()
        };

        for (id, entry) in listed {
            let keep = policy.filters.iter().all(|filter| match filter {
                TreeFilter::ByAuthor(author) => entry.author() == author,
                TreeFilter::ByKind(kind) => entry.kind() == *kind,
            });
            if !keep {
                continue;
            }

            let children = entry
                .locations
                .iter()
                .enumerate()
                .map(|(index, location)| {
                    let display_root = resolver.root(&location.root_path).unwrap_or(root);
                    TreeNode::Location(LocationNode {
                        root: location.root_path.clone(),
                        entry: id,
                        index,
                        entry_label: entry.label.clone(),
                        display_path: resolver.unique_path(display_root, &location.path),
                        start_line: location.start_line,
                        end_line: location.end_line,
                        label: location.label.clone(),
                    })
                })
                .collect();

            entries.push(EntryNode {
                root: root.path.clone(),
                id,
                label: entry.label.clone(),
                kind: entry.kind(),
                author: entry.author().to_string(),
                children,
            });
        }
    }

    match policy.mode {
        TreeMode::ByEntry => entries.into_iter().map(TreeNode::Entry).collect(),
        TreeMode::ByFile => group_by_file(entries),
    }
}

fn group_by_file(entries: Vec<EntryNode>) -> Vec<TreeNode> {
    let mut groups: BTreeMap<PathBuf, Vec<LocationNode>> = BTreeMap::new();
    for entry in entries {
        for child in entry.children {
            if let TreeNode::Location(location) = child {
                groups
                    .entry(location.display_path.clone())
                    .or_default()
                    .push(location);
            }
        }
    }

    groups
        .into_iter()
        .map(|(display_path, mut locations)| {
            locations.sort_by_key(|l| (l.start_line, l.end_line));
            TreeNode::PathGroup(PathGroupNode {
                display_path,
                children: locations.into_iter().map(TreeNode::Location).collect(),
            })
        })
        .collect()
}
