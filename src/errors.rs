//! Unified error type for the points ledger.
//!
//! Domain failures (`Validation`, `NotFound`, `Unauthorized`) are reported to the
//! caller and never leave partially written records behind. Infrastructure
//! failures wrap the underlying library error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: empty demand, negative values, blank names, bad ranges.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The acting user may not perform this action.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("Feedback", 42);
        assert_eq!(err.to_string(), "Feedback not found: 42");
    }

    #[test]
    fn test_env_var_error_converts() {
        let err: Error = std::env::VarError::NotPresent.into();
        assert!(matches!(err, Error::EnvVar(_)));
    }

    #[test]
    fn test_validation_message() {
        let err = Error::validation("demand must contain at least one item");
        assert_eq!(
            err.to_string(),
            "Validation error: demand must contain at least one item"
        );
    }
}
