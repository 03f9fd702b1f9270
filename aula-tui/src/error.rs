//! Error types for the TUI.

use crate::api_client::ApiClientError;
use crate::config::ConfigLoadError;
use crate::persistence::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
