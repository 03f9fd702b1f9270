//! Configuration loading for the Aula TUI.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use aula_cache::{CacheConfig, RetryPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "AULA_TUI_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    pub api_base_url: String,
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    pub refresh_interval_ms: u64,
    pub page_size: usize,
    pub persistence_path: PathBuf,
    pub error_log_path: PathBuf,
    pub log: LogConfig,
    pub cache: CacheSettings,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    pub stale_after_ms: u64,
    pub expire_after_ms: u64,
    pub gc_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
}

/// Failure to produce a usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Missing configuration file path (use --config or AULA_TUI_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] aula_core::ConfigError),
}

fn invalid(field: &str, reason: &str) -> aula_core::ConfigError {
    aula_core::ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigLoadError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), aula_core::ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(invalid("api_base_url", "must not be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(invalid("api_base_url", "must start with http:// or https://"));
        }
        if let Some(token) = &self.auth.bearer_token {
            if token.trim().is_empty() {
                return Err(invalid("auth.bearer_token", "must not be blank when set"));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be > 0"));
        }
        if self.refresh_interval_ms == 0 {
            return Err(invalid("refresh_interval_ms", "must be > 0"));
        }
        if self.page_size == 0 {
            return Err(invalid("page_size", "must be > 0"));
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(invalid("persistence_path", "must not be empty"));
        }
        if self.error_log_path.as_os_str().is_empty() {
            return Err(invalid("error_log_path", "must not be empty"));
        }
        if self.log.level.trim().is_empty() {
            return Err(invalid("log.level", "must not be empty"));
        }
        if self.cache.expire_after_ms == 0 {
            return Err(invalid("cache.expire_after_ms", "must be > 0"));
        }
        if self.cache.stale_after_ms > self.cache.expire_after_ms {
            return Err(invalid("cache.stale_after_ms", "must be <= expire_after_ms"));
        }
        if self.cache.gc_interval_ms == 0 {
            return Err(invalid("cache.gc_interval_ms", "must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be >= 1"));
        }
        if self.retry.initial_ms == 0 {
            return Err(invalid("retry.initial_ms", "must be > 0"));
        }
        if self.retry.max_ms < self.retry.initial_ms {
            return Err(invalid("retry.max_ms", "must be >= initial_ms"));
        }
        if self.retry.multiplier.is_nan() || self.retry.multiplier < 1.0 {
            return Err(invalid("retry.multiplier", "must be >= 1.0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.retry.max_attempts)
            .with_initial_backoff(Duration::from_millis(self.retry.initial_ms))
            .with_max_backoff(Duration::from_millis(self.retry.max_ms))
            .with_multiplier(self.retry.multiplier)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_stale_after(Duration::from_millis(self.cache.stale_after_ms))
            .with_expire_after(Duration::from_millis(self.cache.expire_after_ms))
            .with_gc_interval(Duration::from_millis(self.cache.gc_interval_ms))
            .with_retry(self.retry_policy())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
