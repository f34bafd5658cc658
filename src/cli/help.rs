//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string used in log records (e.g. "audit", "show").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Labels => "labels",
        Commands::Classify { .. } => "classify",
        Commands::Audit { .. } => "audit",
        Commands::Mark { .. } => "mark",
        Commands::Add { .. } => "add",
        Commands::Show { .. } => "show",
        Commands::Validate { .. } => "validate",
        Commands::Merge { .. } => "merge",
        Commands::Daylog => "daylog",
    }
}
