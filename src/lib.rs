pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod morgue;
pub mod reports;
pub mod store;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use clap::Parser;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;

pub use crate::morgue::Morgue;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli::execute(cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(error = %error, "command failed");
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
/// With a log directory, JSON lines go to a daily rolling file; otherwise
/// plain lines go to stderr so stdout stays clean for command output.
pub fn init_tracing(config: &AppConfig) -> AppResult<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_level))
        .map_err(|error| AppError::Config(format!("log_level: {}", error)))?;

    let result = match &config.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir).map_err(|error| AppError::Io(error.to_string()))?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "morgue-ledger.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(non_blocking)
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    result.map_err(|error| AppError::Internal(error.to_string()))
}
