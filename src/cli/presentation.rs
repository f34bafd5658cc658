//! CLI presentation: text formatters per command family.

mod annotations;
mod shared;

pub use annotations::{
    format_audit_toggles, format_entry_added, format_merge_summary, format_region_mark,
    format_tree,
};
pub use shared::{
    format_classification, format_day_logs, format_roots, format_validation_report,
    ValidationLine,
};
