//! Request and response values flowing through the client
//!
//! A [`RequestConfig`] is built once per call and handed by value from stage to
//! stage; a [`ResponseEnvelope`] is what the classifier produces from the
//! transport's `(payload, meta)` reply.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sails_transport_traits::{Headers, ResponseMeta, TransportRequest, Verb};

/// One verb call, as seen by request transform stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Request payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Verb of the call
    pub method: Verb,

    /// Target route
    pub url: String,

    /// Per-request headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl RequestConfig {
    /// Create a request with no payload and no headers.
    pub fn new(method: Verb, url: impl Into<String>) -> Self {
        Self {
            data: None,
            method,
            url: url.into(),
            headers: None,
        }
    }

    /// Set the payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set one header, creating the header map if needed.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    /// Insert `key` into an object payload.
    ///
    /// An absent or `null` payload becomes an empty object first. Returns `false`
    /// and leaves the payload untouched when it is some other non-object value.
    pub fn insert_data(&mut self, key: impl Into<String>, value: Value) -> bool {
        if matches!(self.data, None | Some(Value::Null)) {
            self.data = Some(Value::Object(Map::new()));
        }
        match self.data.as_mut() {
            Some(Value::Object(map)) => {
                map.insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn into_transport_request(self) -> TransportRequest {
        TransportRequest {
            verb: self.method,
            url: self.url,
            data: self.data,
            headers: self.headers,
        }
    }
}

/// A classified transport reply: the payload plus its transport metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Reply payload
    #[serde(default)]
    pub data: Option<Value>,

    /// Transport metadata (status code, headers, ...)
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
}

impl ResponseEnvelope {
    /// Wrap a raw reply.
    pub fn new(data: Option<Value>, meta: Option<ResponseMeta>) -> Self {
        Self { data, meta }
    }

    /// Status code of the reply. A zero status counts as absent.
    #[must_use]
    pub fn status_code(&self) -> Option<i64> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.status_code)
            .filter(|code| *code != 0)
    }

    /// Returns `true` unless a status code outside `2xx` is present.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code().is_none_or(|code| code / 100 == 2)
    }

    /// Deserialize the payload; an absent payload reads as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone().unwrap_or(Value::Null))
    }
}
