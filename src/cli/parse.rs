//! CLI parse: clap types for coaudit. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// coaudit - collaborative code-audit annotations across workspace roots
#[derive(Parser)]
#[command(name = "coaudit")]
#[command(about = "Mark audited files and regions, record findings, and reconcile reviewers' annotation files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (repeat for multi-root workspaces; default: .)
    #[arg(long = "root", global = true)]
    pub roots: Vec<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Author name (overrides configuration and login name)
    #[arg(long, global = true)]
    pub author: Option<String>,

    /// Enable verbose logging
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List workspace roots and their display labels
    Labels,
    /// Show which root a path belongs to
    Classify {
        /// File or directory path
        path: PathBuf,
    },
    /// Toggle the audited status of files or directories
    Audit {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Toggle partially audited line ranges (1-based, inclusive)
    Mark {
        /// File path
        path: PathBuf,
        /// Line ranges as START:END or a single LINE
        #[arg(required = true, value_parser = parse_span)]
        spans: Vec<LineSpan>,
    },
    /// Add a finding or note
    Add {
        #[arg(value_enum)]
        kind: KindArg,
        /// Entry label
        label: String,
        /// File path
        path: PathBuf,
        /// Line range as START:END or a single LINE
        #[arg(value_parser = parse_span)]
        span: LineSpan,
        /// Severity (findings)
        #[arg(long, default_value = "")]
        severity: String,
        /// Difficulty (findings)
        #[arg(long, default_value = "")]
        difficulty: String,
        /// Finding type
        #[arg(long = "type", default_value = "")]
        finding_type: String,
        /// Free-form description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show findings and notes
    Show {
        /// Group by file instead of by entry
        #[arg(long)]
        by_file: bool,
        /// Show resolved entries
        #[arg(long)]
        resolved: bool,
        /// Load every author's file, not only your own
        #[arg(long)]
        all: bool,
    },
    /// Check annotation files against the schema
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Reconcile two annotation files without losing either side's data
    Merge {
        /// File whose order and remote info win
        primary: PathBuf,
        secondary: PathBuf,
        /// Write the merged document here instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show files marked audited per day
    Daylog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Finding,
    Note,
}

/// Inclusive 0-based line span parsed from 1-based command-line input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: u32,
    pub end: u32,
}

pub fn parse_span(value: &str) -> Result<LineSpan, String> {
    let (start, end) = value.split_once(':').unwrap_or((value, value));
    let line = |s: &str| -> Result<u32, String> {
        match s.trim().parse::<u32>() {
            Ok(0) => Err("line numbers start at 1".to_string()),
            Ok(n) => Ok(n - 1),
            Err(_) => Err(format!("invalid line number '{}'", s)),
        }
    };
    let (start, end) = (line(start)?, line(end)?);
    Ok(LineSpan {
        start: start.min(end),
        end: start.max(end),
    })
}
