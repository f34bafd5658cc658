//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, the
//! workspace config files, then `COAUDIT__*` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

mod merge {
    pub(super) mod merge_policy;
}
mod sources {
    pub(super) mod global_file;
    pub(super) mod workspace_file;
}

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoauditConfig {
    /// Author name written into annotation files; falls back to the login name
    #[serde(default)]
    pub author: Option<String>,

    /// Where annotation files live inside each root
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Layout of the per-root annotation directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory relative to the root
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// Extension of per-author files (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Day log file name inside `dir`
    #[serde(default = "default_day_log")]
    pub day_log: String,
}

fn default_storage_dir() -> String {
    ".vscode".to_string()
}

fn default_extension() -> String {
    "weaudit".to_string()
}

fn default_day_log() -> String {
    ".weauditdaylog".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            extension: default_extension(),
            day_log: default_day_log(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Author: {0}")]
    Author(String),

    #[error("Storage: {0}")]
    Storage(String),

    #[error("Logging: {0}")]
    Logging(String),
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.dir.is_empty() {
            return Err("Storage directory cannot be empty".to_string());
        }
        if Path::new(&self.dir).is_absolute() {
            return Err(format!("Storage directory must be relative: {}", self.dir));
        }
        if self.extension.is_empty() {
            return Err("Extension cannot be empty".to_string());
        }
        if self.extension.starts_with('.') || self.extension.contains(['/', '\\']) {
            return Err(format!("Invalid extension: {}", self.extension));
        }
        if self.day_log.is_empty() || self.day_log.contains(['/', '\\']) {
            return Err(format!("Invalid day log file name: {:?}", self.day_log));
        }
        Ok(())
    }
}

impl CoauditConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(author) = &self.author {
            if author.trim().is_empty() {
                errors.push(ValidationError::Author("cannot be blank".to_string()));
            } else if author.contains(['/', '\\']) {
                errors.push(ValidationError::Author(format!(
                    "'{}' cannot contain path separators",
                    author
                )));
            }
        }

        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }

        if !["json", "text"].contains(&self.logging.format.as_str()) {
            errors.push(ValidationError::Logging(format!(
                "unknown format '{}'",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Configured author, else the login name, else `anonymous`.
    pub fn resolve_author(&self) -> String {
        self.author
            .clone()
            .filter(|a| !a.trim().is_empty())
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
            .or_else(|| std::env::var("USERNAME").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

/// Builds `CoauditConfig` from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace root.
    pub fn load(workspace_root: &Path) -> Result<CoauditConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let config: CoauditConfig = builder
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        Self::checked(config)
    }

    /// Load configuration from one explicit file (plus defaults and environment).
    pub fn load_from_file(path: &Path) -> Result<CoauditConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let config: CoauditConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        Self::checked(config)
    }

    fn checked(config: CoauditConfig) -> Result<CoauditConfig, ApiError> {
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!("Invalid configuration: {}", msgs.join("; ")))
        })?;
        debug!(storage_dir = %config.storage.dir, "Configuration loaded");
        Ok(config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("COAUDIT")
        .separator("__")
        .try_parsing(true)
}
