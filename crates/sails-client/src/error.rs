//! Error types for the Sails client
//!
//! Every failed call ends in exactly one [`ClientError`]. The variants form a
//! closed set, discriminated by [`ErrorKind`]; each keeps the original cause.

use std::path::PathBuf;

use sails_transport_traits::TransportError;
use thiserror::Error;

use crate::types::ResponseEnvelope;

/// Boxed error returned by transform stages and custom classifiers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Discriminant of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No connection existed when the call was made.
    NotConnected,
    /// A request or response transform stage failed.
    TransformFailure,
    /// The classifier decided the reply is a failure.
    ClassifiedFailure,
    /// The transport itself failed.
    TransportFailure,
}

/// Errors surfaced by verb calls, subscriptions and lifecycle operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A verb method was called while no transport handle exists.
    #[error("Socket has not been connected before attempting to run a socket request")]
    NotConnected,

    /// A transform stage failed; `source` is the error the stage returned.
    #[error("Transform stage '{stage}' failed: {source}")]
    Transform {
        /// Name of the failing stage
        stage: String,
        /// The stage's own error
        #[source]
        source: BoxError,
    },

    /// The reply was classified as a failure.
    #[error("Request rejected: {}", describe_status(.envelope))]
    Classified {
        /// The classified reply, for inspecting status and payload
        envelope: Box<ResponseEnvelope>,
    },

    /// The transport failed to connect, emit or deliver.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn describe_status(envelope: &ResponseEnvelope) -> String {
    match envelope.status_code() {
        Some(code) => format!("status {code}"),
        None => "no status".to_string(),
    }
}

impl ClientError {
    /// Create a transform failure for `stage`.
    pub fn transform(stage: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transform {
            stage: stage.into(),
            source: source.into(),
        }
    }

    /// Create a classified failure carrying `envelope`.
    pub fn classified(envelope: ResponseEnvelope) -> Self {
        Self::Classified {
            envelope: Box::new(envelope),
        }
    }

    /// Which of the four failure kinds this is.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConnected => ErrorKind::NotConnected,
            Self::Transform { .. } => ErrorKind::TransformFailure,
            Self::Classified { .. } => ErrorKind::ClassifiedFailure,
            Self::Transport(_) => ErrorKind::TransportFailure,
        }
    }

    /// The rejected reply, for classified failures.
    #[must_use]
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Classified { envelope } => Some(envelope.as_ref()),
            _ => None,
        }
    }

    /// Returns `true` for [`ClientError::NotConnected`].
    #[must_use]
    pub const fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use sails_transport_traits::ResponseMeta;
    use serde_json::json;

    #[derive(Debug, Error)]
    #[error("token expired")]
    struct TokenExpired;

    #[test]
    fn test_kinds() {
        assert_eq!(ClientError::NotConnected.kind(), ErrorKind::NotConnected);
        assert_eq!(
            ClientError::transform("auth", TokenExpired).kind(),
            ErrorKind::TransformFailure
        );
        assert_eq!(
            ClientError::from(TransportError::Internal("x".into())).kind(),
            ErrorKind::TransportFailure
        );
    }

    #[test]
    fn test_transform_keeps_original_error() {
        let err = ClientError::transform("auth", TokenExpired);
        assert!(err.to_string().contains("'auth'"));
        let ClientError::Transform { source, .. } = err else {
            panic!("expected transform failure");
        };
        assert!(source.downcast_ref::<TokenExpired>().is_some());
    }

    #[test]
    fn test_classified_display_and_envelope() {
        let envelope = ResponseEnvelope::new(Some(json!({"error": "nope"})), Some(ResponseMeta::with_status(404)));
        let err = ClientError::classified(envelope.clone());
        assert_eq!(err.to_string(), "Request rejected: status 404");
        assert_eq!(err.envelope(), Some(&envelope));
        assert!(ClientError::NotConnected.envelope().is_none());
    }
}
