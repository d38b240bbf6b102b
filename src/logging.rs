//! Tracing subscriber setup.
//!
//! Output goes to stderr; stdout carries the stdio protocol. `RUST_LOG`, when
//! set, takes precedence over the configured level.

use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Errors from [`init`].
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level '{0}'. Must be one of: trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("Failed to initialize tracing: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber described by `config`.
///
/// Calling this more than once is harmless; later calls keep the first
/// subscriber.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let level = parse_log_level(&config.level)?;
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

/// Validate a level name, returning its canonical lowercase form.
fn parse_log_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" => Ok("warn"),
        "error" => Ok("error"),
        _ => Err(LoggingError::InvalidLevel(level.to_string())),
    }
}
