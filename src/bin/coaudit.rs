//! coaudit command-line entry point

use clap::Parser;
use coaudit::cli::{map_error, Cli, RunContext};
use coaudit::config::ConfigLoader;
use coaudit::error::ApiError;
use coaudit::logging::{init_logging, LoggingConfig};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(Some(&logging_for(&cli))) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", map_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, ApiError> {
    // One command per process; saves are awaited in order.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ApiError::ConfigError(format!("Cannot start runtime: {}", e)))?;

    runtime.block_on(async {
        let mut context =
            RunContext::new(cli.roots.clone(), cli.config.clone(), cli.author.clone()).await?;
        debug!(roots = context.orchestrator().roots().len(), "Workspace opened");
        context.execute(&cli.command).await
    })
}

/// The `[logging]` table from the same config the command will load, with the
/// global log flags applied on top. A broken config falls back to defaults
/// here; the command itself reports the error.
fn logging_for(cli: &Cli) -> LoggingConfig {
    let loaded = match (&cli.config, cli.roots.first()) {
        (Some(file), _) => ConfigLoader::load_from_file(file),
        (None, Some(root)) => ConfigLoader::load(root),
        (None, None) => ConfigLoader::load(Path::new(".")),
    };
    let mut logging = loaded.map(|c| c.logging).unwrap_or_default();

    if cli.verbose {
        logging.level = "debug".to_string();
    }
    let overrides = [
        (&cli.log_level, &mut logging.level),
        (&cli.log_format, &mut logging.format),
        (&cli.log_output, &mut logging.output),
    ];
    for (flag, field) in overrides {
        if let Some(value) = flag {
            *field = value.clone();
        }
    }
    logging
}
