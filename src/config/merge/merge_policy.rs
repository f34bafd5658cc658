//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables merge, scalars and
/// arrays replace.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("storage.dir", ".vscode")?
        .set_default("storage.extension", "weaudit")?
        .set_default("storage.day_log", ".weauditdaylog")
}
