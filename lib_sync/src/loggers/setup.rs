//! # Logging Setup
//!
//! Installs the global `tracing` subscriber used by front-ends:
//!
//! - a human readable console layer on **stderr**, so it never interleaves
//!   with a REPL's stdout;
//! - a JSON layer writing to `<log_dir>/<file_prefix>.<date>` with daily
//!   rotation through a non-blocking writer.
//!
//! `RUST_LOG` wins over the configured level when it is set.

use std::io;
use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Why logging could not be installed.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("Cannot create log directory: {0}")]
    Io(#[from] io::Error),

    /// The level is not a valid filter directive.
    #[error("Invalid log level {level:?}: {reason}")]
    Filter {
        /// The rejected directive.
        level: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("Logging already initialised: {0}")]
    AlreadyInitialised(String),
}

/// Installs console and file logging.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the program.
pub fn setup_logging(log_dir: &Path, level: &str, file_prefix: &str) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(log_dir)?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::Filter {
            level: level.to_string(),
            reason: e.to_string(),
        })?,
    };

    let file_appender = rolling::daily(log_dir, file_prefix);
    let (file_writer, guard) = non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(io::stderr);

    let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer).json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialised(e.to_string()))?;

    Ok(guard)
}
