//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// The ledger engine reports a richer error; callers at the application boundary
/// collapse it into one of these categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before anything was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the current state of the ledger.
    #[error("State error: {0}")]
    State(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ledger integrity violated (audit chain tampered or halted).
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Conflict (lock timeout, duplicate reference).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::State(_) => 422,
            Self::Integrity(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::State(_) => "STATE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
