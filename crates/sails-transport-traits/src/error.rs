//! Transport error types.

use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Represents errors that can occur during transport operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// Failed to establish a connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An established connection was lost, or a reply will never arrive.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Failed to emit a request or subscription.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The handle does not name an open connection of this transport.
    #[error("Unknown connection handle: {0}")]
    UnknownHandle(u64),

    /// Failed to serialize or deserialize a payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// A request did not receive its reply in time.
    #[error(
        "Request timed out after {timeout:?} for operation: {operation}. \
         If this is expected, raise `request_timeout_ms` in the client configuration"
    )]
    RequestTimeout {
        /// The operation that timed out
        operation: String,
        /// The timeout duration that was exceeded
        timeout: Duration,
    },

    /// The transport or client was configured with invalid parameters.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed(err.to_string())
    }
}

impl TransportError {
    /// Returns `true` if the error means the connection can no longer be used.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::ConnectionLost(_) | Self::UnknownHandle(_)
        )
    }
}
