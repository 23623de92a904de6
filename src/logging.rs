//! Diagnostic logging.
//!
//! Structured logging via `tracing`. Diagnostics always go to stderr:
//! stdout is reserved for the progress counts and status lines that an
//! external monitor reads line by line.

use crate::error::{GenError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding a full filter directive (e.g. `omnigen=debug`).
pub const LOG_ENV: &str = "OMNIGEN_LOG";

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                s
            )),
        }
    }
}

/// Logging settings from the command line.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error or off
    pub level: String,
    pub format: LogFormat,
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            color: true,
        }
    }
}

/// Install the global subscriber.
///
/// `OMNIGEN_LOG` takes priority over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(config)?;
    let base = Registry::default().with(filter);

    let installed = match config.format {
        LogFormat::Json => base
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => base
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(config.color)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| GenError::InvalidConfiguration(format!("Logging setup failed: {}", e)))
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    match config.level.as_str() {
        "off" | "error" | "warn" | "info" | "debug" | "trace" => Ok(EnvFilter::new(&config.level)),
        other => Err(GenError::InvalidConfiguration(format!(
            "Invalid log level: {} (must be trace, debug, info, warn, error or off)",
            other
        ))),
    }
}
