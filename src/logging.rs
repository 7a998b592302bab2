//! Tracing setup for the diagnostics.
//!
//! Logs go to stderr so stdout carries only the report. `RUST_LOG` wins over
//! the configured level when set.

use tracing_subscriber::EnvFilter;

use crate::config::ApplicationConfig;

/// Error returned when a global subscriber is already installed.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global subscriber described by `config`.
pub fn init(config: &ApplicationConfig) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    }
}
