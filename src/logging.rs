//! Logging System
//!
//! Structured logging through `tracing`. The configured level, format and
//! destination are resolved into [`LogSettings`], with `COAUDIT_LOG*`
//! environment variables taking precedence over the configuration file.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LEVEL_VAR: &str = "COAUDIT_LOG";
const MODULES_VAR: &str = "COAUDIT_LOG_MODULES";
const FORMAT_VAR: &str = "COAUDIT_LOG_FORMAT";
const OUTPUT_VAR: &str = "COAUDIT_LOG_OUTPUT";

/// `[logging]` table of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error or off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr or file
    #[serde(default = "default_output")]
    pub output: String,

    /// Used when `output = "file"`
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// ANSI colors for text output on a terminal stream
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `"coaudit::region" = "trace"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

// Command output goes to stdout.
fn default_output() -> String {
    "stderr".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(".vscode/coaudit.log")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogOutput {
    fn parse(s: &str, file: &Path) -> Result<Self, ApiError> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File(file.to_path_buf())),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
                other
            ))),
        }
    }

    fn make_writer(&self) -> Result<BoxMakeWriter, ApiError> {
        Ok(match self {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File(path) => BoxMakeWriter::new(open_append(path)?),
        })
    }
}

/// Fully resolved logging setup.
#[derive(Debug)]
pub struct LogSettings {
    pub directives: Vec<String>,
    pub format: LogFormat,
    pub output: LogOutput,
    pub color: bool,
}

impl LogSettings {
    /// Resolve `config` (or defaults) against the environment.
    pub fn resolve(config: Option<&LoggingConfig>) -> Result<Self, ApiError> {
        let fallback = LoggingConfig::default();
        let config = config.unwrap_or(&fallback);

        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let mut directives = match env(LEVEL_VAR) {
            Some(level) => vec![level],
            None => {
                let mut d = vec![config.level.clone()];
                if config.level != "off" {
                    let mut modules: Vec<_> = config.modules.iter().collect();
                    modules.sort();
                    d.extend(modules.into_iter().map(|(m, l)| format!("{}={}", m, l)));
                }
                d
            }
        };
        if let Some(modules) = env(MODULES_VAR) {
            directives.extend(parse_module_directives(&modules));
        }

        // An unusable env override falls back to the configured format.
        let format = env(FORMAT_VAR)
            .and_then(|f| f.parse::<LogFormat>().ok())
            .map_or_else(|| config.format.parse(), Ok)?;
        let output = match env(OUTPUT_VAR) {
            Some(output) => LogOutput::parse(&output, &config.file)?,
            None => LogOutput::parse(&config.output, &config.file)?,
        };
        let color = config.color && !matches!(output, LogOutput::File(_));

        Ok(Self {
            directives,
            format,
            output,
            color,
        })
    }

    fn filter(&self) -> Result<EnvFilter, ApiError> {
        let mut parts = self.directives.iter();
        let base = parts.next().map(String::as_str).unwrap_or("warn");
        let mut filter = EnvFilter::try_new(base)
            .map_err(|e| ApiError::ConfigError(format!("Invalid log level {:?}: {}", base, e)))?;
        for directive in parts {
            let parsed = directive.parse::<Directive>().map_err(|e| {
                ApiError::ConfigError(format!("Invalid log directive {:?}: {}", directive, e))
            })?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let settings = LogSettings::resolve(config)?;
    let registry = Registry::default().with(settings.filter()?);
    let writer = settings.output.make_writer()?;

    let installed = match settings.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(settings.color)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Failed to initialize logging: {}", e)))
}

fn open_append(path: &Path) -> Result<std::fs::File, ApiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApiError::ConfigError(format!("Cannot create log directory {}: {}", parent.display(), e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Cannot open log file {}: {}", path.display(), e)))
}

/// `a=debug, b=trace` -> `["a=debug", "b=trace"]`; malformed pairs are skipped.
fn parse_module_directives(spec: &str) -> Vec<String> {
    spec.split(',')
        .filter_map(|pair| {
            let (module, level) = pair.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            (!module.is_empty() && !level.is_empty()).then(|| format!("{}={}", module, level))
        })
        .collect()
}
