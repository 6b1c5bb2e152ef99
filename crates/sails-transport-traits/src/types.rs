//! Core transport types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header map carried by requests and replies.
pub type Headers = HashMap<String, String>;

/// Opaque reference to one logical connection opened by a transport.
///
/// Handles are cheap to clone. A handle stays valid until it is passed to
/// [`SocketTransport::close`](crate::SocketTransport::close); using it afterwards
/// yields [`TransportError::UnknownHandle`](crate::TransportError::UnknownHandle).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    id: u64,
    address: String,
}

impl ConnectionHandle {
    /// Create a handle. Only transports should need this.
    pub fn new(id: u64, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
        }
    }

    /// Transport-assigned connection id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Address the connection was opened against.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.id, self.address)
    }
}

/// A verb-style call kind, mapped one-to-one onto a transport invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verb {
    /// `get`
    Get,
    /// `post`
    Post,
    /// `put`
    Put,
    /// `patch`
    Patch,
    /// `delete`
    Delete,
    /// Any other verb the remote end understands.
    Custom(String),
}

impl Verb {
    /// Returns `true` for verbs that carry a request body (`post`, `put`, `patch`, `delete`).
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Lower-case wire name of the verb.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Verb {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "get" => Self::Get,
            "post" => Self::Post,
            "put" => Self::Put,
            "patch" => Self::Patch,
            "delete" => Self::Delete,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for Verb {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<Verb> for String {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// What the client asks the transport to emit for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRequest {
    /// Call kind.
    pub verb: Verb,
    /// Target route on the remote end.
    pub url: String,
    /// Request payload; `None` is sent as an absent payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Per-request headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

/// Transport-level metadata delivered next to a reply payload.
///
/// Fields the client does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Numeric status of the reply, HTTP-style. Any integer is accepted; the
    /// client only looks at its hundreds digit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,

    /// Reply headers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: Headers,

    /// Raw reply body, when the transport exposes it separately from the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Any other metadata fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ResponseMeta {
    /// Metadata carrying only a status code.
    #[must_use]
    pub fn with_status(status_code: i64) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::default()
        }
    }
}
