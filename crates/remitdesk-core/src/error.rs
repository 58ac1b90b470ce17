//! Error types and result handling for request operations.
//!
//! Defines a storage-level error type produced by the repositories and an
//! application-level taxonomy with codes for client disambiguation and HTTP
//! status mapping.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input rejected by the database (type or encoding mismatch).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested entity not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::ConstraintViolation(format!("foreign key constraint violation: {db_err}"))
            },
            sqlx::Error::Encode(e) => Self::InvalidInput(e.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Application error taxonomy surfaced at the HTTP boundary.
///
/// Notification failures are deliberately absent: they are logged by the
/// notifier and never reach a caller.
#[derive(Debug, Error)]
pub enum RemitError {
    /// Authentication payload failed signature verification (E1001).
    #[error("[E1001] Verification failed: {reason}")]
    VerificationFailed {
        /// Why the payload was rejected
        reason: String,
    },

    /// No request exists with the given identifier (E1002).
    #[error("[E1002] Request not found: {id}")]
    RequestNotFound {
        /// The identifier as supplied by the caller
        id: String,
    },

    /// Request body could not be decoded (E1003).
    #[error("[E1003] Malformed request body: {reason}")]
    MalformedBody {
        /// Decoder error description
        reason: String,
    },

    /// Persistence layer failed (E3001).
    #[error("[E3001] Storage failure: {0}")]
    Storage(#[from] CoreError),
}

impl RemitError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::VerificationFailed { .. } => "E1001",
            Self::RequestNotFound { .. } => "E1002",
            Self::MalformedBody { .. } => "E1003",
            Self::Storage(_) => "E3001",
        }
    }

    /// Whether the error was caused by the caller rather than the server.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. } | Self::RequestNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(RemitError::VerificationFailed { reason: "x".into() }.code(), "E1001");
        assert_eq!(RemitError::RequestNotFound { id: "7".into() }.code(), "E1002");
        assert_eq!(RemitError::MalformedBody { reason: "x".into() }.code(), "E1003");
        assert_eq!(RemitError::Storage(CoreError::Database("down".into())).code(), "E3001");
    }

    #[test]
    fn malformed_body_is_not_a_client_error() {
        // Shape errors are reported the same way as storage failures.
        assert!(!RemitError::MalformedBody { reason: "x".into() }.is_client_error());
        assert!(RemitError::RequestNotFound { id: "1".into() }.is_client_error());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = CoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn display_includes_code() {
        let err = RemitError::RequestNotFound { id: "42".into() };
        assert_eq!(err.to_string(), "[E1002] Request not found: 42");
    }
}
