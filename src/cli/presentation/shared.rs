//! Shared presentation: roots, classification, day logs, validation reports.

use crate::daylog::DayLog;
use crate::roots::{Classification, WorkspaceRoot};
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

pub fn format_roots(roots: &[WorkspaceRoot]) -> String {
    if roots.is_empty() {
        return "No workspace roots.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Label", "Path", "Notes"]);
    for root in roots {
        let notes = if root.degraded {
            "filesystem root: no label"
        } else {
            ""
        };
        table.add_row(vec![
            root.label.clone(),
            root.path.display().to_string(),
            notes.to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_classification(
    path: &Path,
    classification: &Classification,
    unique_path: Option<&Path>,
    containing: &[(WorkspaceRoot, PathBuf)],
) -> String {
    let Some(root) = &classification.root else {
        return format!("{} is not inside any workspace root", path.display());
    };

    let mut lines = vec![
        format!("Path:      {}", path.display()),
        format!("Root:      {} ({})", root.label, root.path.display()),
        format!("Relative:  {}", classification.relative_path.display()),
    ];
    if let Some(unique) = unique_path {
        lines.push(format!("Unique:    {}", unique.display()));
    }
    if classification.ambiguous {
        lines.push(format!("{}", "Ambiguous: inside nested roots".yellow()));
        for (root, relative) in containing {
            lines.push(format!("  - {}: {}", root.label, relative.display()));
        }
    }
    lines.join("\n")
}

pub fn format_day_logs(logs: &[(&WorkspaceRoot, &DayLog)]) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Root", "Date", "Files"]);
    let mut rows = 0;
    for (root, log) in logs {
        for (date, files) in log.days() {
            table.add_row(vec![
                root.label.clone(),
                date.format("%Y-%m-%d").to_string(),
                files.join("\n"),
            ]);
            rows += 1;
        }
    }
    if rows == 0 {
        return "No files marked audited yet.".to_string();
    }
    table.to_string()
}

/// One validated file: counts on success, the failure message otherwise.
pub struct ValidationLine {
    pub file: PathBuf,
    pub outcome: Result<(usize, usize, usize), String>,
}

pub fn format_validation_report(lines: &[ValidationLine]) -> String {
    let failed = lines.iter().filter(|l| l.outcome.is_err()).count();
    let mut out: Vec<String> = lines
        .iter()
        .map(|line| match &line.outcome {
            Ok((entries, audited, regions)) => format!(
                "{} {} ({} entries, {} audited files, {} regions)",
                "ok".green(),
                line.file.display(),
                entries,
                audited,
                regions
            ),
            Err(message) => format!("{} {}", "invalid".red(), message),
        })
        .collect();
    out.push(String::new());
    out.push(format!(
        "{} file(s) checked, {} invalid",
        lines.len(),
        failed
    ));
    out.join("\n")
}
