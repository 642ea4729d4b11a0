//! Tracing subscriber setup

use crate::sdk::errors::{Result, SDKError};
use std::env;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted when no level is given on the command line
pub const ENV_LOG_LEVEL: &str = "LITELLM_LOG_LEVEL";

/// Build the filter for `level`.
///
/// `RUST_LOG` wins when set, so individual targets can still be tuned.
pub fn log_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = level.trim().to_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => {}
        other => {
            return Err(SDKError::ConfigError(format!(
                "Unknown log level '{}'",
                other
            )));
        }
    }

    EnvFilter::try_new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        .map_err(|e| SDKError::ConfigError(format!("Invalid log filter: {}", e)))
}

/// Install the global subscriber, writing to stderr.
///
/// Falls back to `LITELLM_LOG_LEVEL` and then `warn` when `level` is `None`.
pub fn init_logging(level: Option<&str>, json: bool) -> Result<()> {
    let level = level
        .map(str::to_string)
        .or_else(|| env::var(ENV_LOG_LEVEL).ok())
        .unwrap_or_else(|| "warn".to_string());
    let filter = log_filter(&level)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| SDKError::ConfigError(format!("Failed to initialize logging: {}", e)))
}
