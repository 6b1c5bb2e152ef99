//! Transport configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Options handed to [`SocketTransport::open`](crate::SocketTransport::open).
///
/// Transports read the fields they understand and ignore the rest; anything
/// transport-specific goes in `custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketOptions {
    /// Headers sent with the connection handshake.
    pub headers: HashMap<String, String>,

    /// Query parameters appended to the connection URL.
    pub query: HashMap<String, String>,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// A map for any other transport-specific options.
    pub custom: HashMap<String, serde_json::Value>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            query: HashMap::new(),
            connect_timeout_ms: 30_000, // 30 seconds
            custom: HashMap::new(),
        }
    }
}

impl SocketOptions {
    /// Add a handshake header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Connection establishment timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
