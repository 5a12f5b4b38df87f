//! Error types for bistro-link.
//!
//! [`BistroLinkError`] is the crate-wide error enum (teacher `KalamLinkError`
//! variant set, adapted for the notification domain) and [`Result`] is the
//! matching convenience alias. Built on `thiserror`.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BistroLinkError>;

/// Errors surfaced by the bistro-link client.
#[derive(Debug, Error)]
pub enum BistroLinkError {
    /// Transport-level failure talking to the backend.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Authentication/authorization failure. Fatal when raised from a token
    /// refresh (forces logout).
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Request rejected as invalid by the server (never retried).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A malformed or unexpected protocol frame was received.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// WebSocket push-connection failure.
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// An operation exceeded its deadline.
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// The client was configured incorrectly.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The server returned a non-success status.
    #[error("Server error ({status_code}): {message}")]
    ServerError {
        /// HTTP status code.
        status_code: u16,
        /// Server-provided (or synthesized) message.
        message: String,
    },

    /// An unexpected internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl BistroLinkError {
    /// Build an error from an HTTP status code and message.
    ///
    /// - 401/403 → [`AuthenticationError`](BistroLinkError::AuthenticationError)
    /// - 400/422 → [`ValidationError`](BistroLinkError::ValidationError)
    /// - anything else → [`ServerError`](BistroLinkError::ServerError)
    pub fn from_status(status_code: u16, message: String) -> BistroLinkError {
        match status_code {
            401 | 403 => BistroLinkError::AuthenticationError(message),
            400 | 422 => BistroLinkError::ValidationError(message),
            _ => BistroLinkError::ServerError {
                status_code,
                message,
            },
        }
    }

    /// Whether this error represents an authentication failure.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, BistroLinkError::AuthenticationError(_))
    }
}

impl From<reqwest::Error> for BistroLinkError {
    fn from(err: reqwest::Error) -> BistroLinkError {
        if err.is_timeout() {
            BistroLinkError::TimeoutError(err.to_string())
        } else {
            BistroLinkError::NetworkError(err.to_string())
        }
    }
}
