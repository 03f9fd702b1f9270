//! Tracing subscriber setup.
//!
//! The terminal belongs to the UI, so every event goes to the configured
//! log file instead of stdout or stderr.

use crate::config::TuiConfig;
use crate::error::TuiError;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` when set and valid, otherwise the configured `log.level`.
pub fn build_env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Call once, before the terminal is taken
/// over.
pub fn init(config: &TuiConfig) -> Result<(), TuiError> {
    if let Some(parent) = config.error_log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.error_log_path)?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(&config.log.level))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TuiError::Logging(e.to_string()))?;

    tracing::info!(
        log_path = %config.error_log_path.display(),
        api = %config.api_base_url,
        "Logging initialized"
    );
    Ok(())
}
