//! Error types for fieldguard
//!
//! Field validation failures are never errors: they are [`ErrorRecord`]s
//! collected per request. The variants here describe caller mistakes.
//!
//! [`ErrorRecord`]: crate::ErrorRecord

use thiserror::Error;

/// Result type alias for fieldguard operations
pub type Result<T, E = ValidatorError> = std::result::Result<T, E>;

/// Boxed error returned by asynchronous predicates
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Programming and configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    /// A chain called a validator name absent from the registry
    #[error("unknown validator `{name}` called on field `{field}`")]
    UnknownValidator { name: String, field: String },

    /// A chain called a sanitizer name absent from the registry
    #[error("unknown sanitizer `{name}` called on field `{field}`")]
    UnknownSanitizer { name: String, field: String },

    /// A schema document could not be read
    #[error("invalid validation schema: {0}")]
    InvalidSchema(String),

    /// The request context has no `Validation` installed
    #[error("validation middleware is not installed on this request")]
    NotInstalled,
}

impl From<serde_json::Error> for ValidatorError {
    fn from(err: serde_json::Error) -> Self {
        ValidatorError::InvalidSchema(err.to_string())
    }
}
