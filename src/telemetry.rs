//! Diagnostic logging.
//!
//! Logs go to stderr so stdout stays reserved for the stage summaries
//! printed by [`crate::output`].

use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log level '{0}'")]
    Level(String),
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Parse a configured level name (`off`, `error`, ... `trace`).
pub fn parse_level(level: &str) -> Result<LevelFilter, TelemetryError> {
    level
        .trim()
        .parse()
        .map_err(|_| TelemetryError::Level(level.to_string()))
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level.
pub fn init(logging: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(parse_level(&logging.level)?.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
