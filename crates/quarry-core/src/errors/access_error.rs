//! Data-access errors.

use super::error_code::{self, QuarryErrorCode};

/// Errors that can occur in the data-access layer.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Execution failed: {message}")]
    Execution { message: String },

    #[error("Commit failed: {message}")]
    Commit { message: String },

    #[error("Rollback failed: {message}")]
    Rollback {
        message: String,
        /// The failure that triggered the rollback. Preserved so cleanup
        /// problems never mask the real cause.
        #[source]
        original: Box<AccessError>,
    },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl AccessError {
    /// The failure that a `Rollback` error was cleaning up after,
    /// or the error itself for every other variant.
    pub fn root_cause(&self) -> &AccessError {
        match self {
            Self::Rollback { original, .. } => original.root_cause(),
            other => other,
        }
    }
}

impl QuarryErrorCode for AccessError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => error_code::CONNECTION,
            Self::Execution { .. } => error_code::EXECUTION,
            Self::Commit { .. } => error_code::COMMIT,
            Self::Rollback { .. } => error_code::ROLLBACK,
            Self::InvalidArgument { .. } => error_code::INVALID_ARGUMENT,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}
