//! Workspace config files at the root: `.coaudit.toml`, then
//! `.coaudit.{COAUDIT_ENV}.toml` when that variable is set.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

fn candidates(workspace_root: &Path) -> Vec<PathBuf> {
    let mut files = vec![workspace_root.join(".coaudit.toml")];
    if let Some(env_name) = std::env::var("COAUDIT_ENV").ok().filter(|e| !e.is_empty()) {
        files.push(workspace_root.join(format!(".coaudit.{}.toml", env_name)));
    }
    files
}

/// Layer the existing workspace files onto `builder`, base file first.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(candidates(workspace_root)
        .into_iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path.as_path()).required(false))
        }))
}
