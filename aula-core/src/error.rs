//! Error types for Aula operations

use thiserror::Error;

/// Failure of a read against the backend.
///
/// Clonable so that every waiter attached to a coalesced fetch receives the
/// same error, and so the cache can keep it on the entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response: {message}")]
    Decode { message: String },
}

impl FetchError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// HTTP status code, when the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network { .. } | Self::Decode { .. } => None,
        }
    }

    /// Human-readable message without the status prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. }
            | Self::Network { message }
            | Self::Decode { message } => message,
        }
    }

    /// Network failures, 5xx, 408 and 429 are worth retrying. Client errors
    /// and undecodable bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Decode { .. } => false,
        }
    }
}

/// Failure of a write operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("Operation failed: {0}")]
    Failed(#[from] FetchError),

    #[error("A mutation for {key} is already in flight")]
    AlreadyInFlight { key: String },

    #[error("Mutation task aborted: {reason}")]
    Aborted { reason: String },
}

impl MutationError {
    /// The underlying backend failure, if the operation itself ran.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(err) => Some(err),
            Self::AlreadyInFlight { .. } | Self::Aborted { .. } => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all Aula errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AulaError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Aula operations.
pub type AulaResult<T> = Result<T, AulaError>;

// =============================================================================
// TESTS
// =============================================================================
