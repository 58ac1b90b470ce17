//! Error types for outbound notifications.
//!
//! These errors stop at the notifier boundary: `TelegramNotifier::notify`
//! logs them and returns nothing, so they never reach an HTTP caller.

use thiserror::Error;

/// Result type alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Failure modes of a single `sendMessage` call.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Network-level connectivity failure.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the network failure
        message: String,
    },

    /// Transport timed out before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// The messaging API answered with a non-success status.
    #[error("messaging API rejected message: HTTP {status_code}")]
    Rejected {
        /// HTTP status code
        status_code: u16,
        /// Response body content (truncated)
        body: String,
    },

    /// The HTTP client could not be built.
    #[error("invalid notifier configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl NotifyError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a rejection error from an HTTP response.
    pub fn rejected(status_code: u16, body: impl Into<String>) -> Self {
        Self::Rejected { status_code, body: body.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Short machine-readable category used in log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout => "timeout",
            Self::Rejected { .. } => "rejected",
            Self::Configuration { .. } => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            NotifyError::network("refused").to_string(),
            "network connection failed: refused"
        );
        assert_eq!(
            NotifyError::rejected(403, "Forbidden").to_string(),
            "messaging API rejected message: HTTP 403"
        );
        assert_eq!(NotifyError::Timeout.to_string(), "request timed out");
    }

    #[test]
    fn kinds_are_distinct() {
        assert_eq!(NotifyError::network("x").kind(), "network");
        assert_eq!(NotifyError::Timeout.kind(), "timeout");
        assert_eq!(NotifyError::rejected(500, "").kind(), "rejected");
        assert_eq!(NotifyError::configuration("x").kind(), "configuration");
    }
}
