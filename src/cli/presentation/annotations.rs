//! Annotation presentation: audit toggles, regions, entries and the tree.

use crate::orchestrator::AuditToggle;
use crate::store::PersistedShape;
use crate::types::{EntryId, EntryKind, Region};
use crate::views::TreeNode;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

pub fn format_audit_toggles(target: &Path, toggles: &[AuditToggle]) -> String {
    let mut lines = Vec::new();
    for toggle in toggles {
        let status = if toggle.outcome.audited {
            format!("{}", "audited".green())
        } else {
            format!("{}", "not audited".yellow())
        };
        lines.push(format!(
            "{} {} (by {})",
            target.display(),
            status,
            toggle.outcome.author
        ));
        for affected in toggle.outcome.affected.iter().skip(1) {
            lines.push(format!("  also {}", affected.display()));
        }
    }
    lines.join("\n")
}

/// `regions` are 0-based; printed 1-based.
pub fn format_region_mark(path: &Path, changed: &[PathBuf], regions: &[&Region]) -> String {
    let mut lines = Vec::new();
    if changed.is_empty() {
        lines.push(format!("{}: no change", path.display()));
    }
    if regions.is_empty() {
        lines.push(format!("{}: no partially audited regions", path.display()));
    } else {
        let spans: Vec<String> = regions
            .iter()
            .map(|r| format!("{}-{}", r.start_line + 1, r.end_line + 1))
            .collect();
        lines.push(format!("{}: {}", path.display(), spans.join(", ")));
    }
    lines.join("\n")
}

pub fn format_entry_added(kind: EntryKind, id: EntryId, label: &str, root_label: &str) -> String {
    format!("Added {} {} '{}' in {}", kind, id, label, root_label)
}

pub fn format_tree(nodes: &[TreeNode]) -> String {
    if nodes.is_empty() {
        return "No entries.".to_string();
    }
    let mut lines = Vec::new();
    for node in nodes {
        render(node, 0, false, &mut lines);
    }
    lines.join("\n")
}

fn render(node: &TreeNode, depth: usize, in_group: bool, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node {
        TreeNode::Entry(entry) => {
            let kind = match entry.kind {
                EntryKind::Finding => format!("{}", "finding".red()),
                EntryKind::Note => format!("{}", "note".cyan()),
            };
            lines.push(format!(
                "{}{} {} [{}] {}",
                indent,
                entry.id,
                entry.label.bold(),
                kind,
                entry.author.dimmed()
            ));
        }
        TreeNode::Location(location) => {
            let mut line = format!(
                "{}{}:{}-{}",
                indent,
                location.display_path.display(),
                location.start_line + 1,
                location.end_line + 1
            );
            // Grouped by file: name the owning entry.
            if in_group {
                line.push_str(&format!("  {} {}", location.entry, location.entry_label));
            }
            if !location.label.is_empty() {
                line.push_str(&format!("  ({})", location.label));
            }
            lines.push(line);
        }
        TreeNode::PathGroup(group) => {
            lines.push(format!("{}{}", indent, group.display_path.display().bold()));
        }
    }
    let grouped = matches!(node, TreeNode::PathGroup(_));
    for child in node.children() {
        render(child, depth + 1, grouped, lines);
    }
}

pub fn format_merge_summary(shape: &PersistedShape, out: Option<&Path>) -> Result<String, serde_json::Error> {
    match out {
        None => serde_json::to_string_pretty(shape),
        Some(path) => Ok(format!(
            "Merged {} entries, {} resolved, {} audited files, {} regions into {}",
            shape.tree_entries.len(),
            shape.resolved_entries.len(),
            shape.audited_files.len(),
            shape.partially_audited_files.len(),
            path.display()
        )),
    }
}
