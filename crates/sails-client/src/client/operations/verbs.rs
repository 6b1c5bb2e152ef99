//! Verb calls
//!
//! Each call runs: connection guard, payload normalization, request
//! transforms, transport exchange, classification, response transforms.
//! The first step that fails decides the outcome and nothing after it runs.

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use sails_transport_traits::{
    Headers, ResponseMeta, SocketTransport, TransportError, TransportRequest, Verb,
};

use crate::error::{ClientError, ClientResult};
use crate::types::{RequestConfig, ResponseEnvelope};

type RawReply = (Option<Value>, Option<ResponseMeta>);

impl<T: SocketTransport + 'static> super::super::core::Client<T> {
    /// Issue a `get` call.
    pub async fn get(
        &self,
        url: &str,
        data: Option<Value>,
        headers: Option<Headers>,
    ) -> ClientResult<ResponseEnvelope> {
        self.request(Verb::Get, url, data, headers).await
    }

    /// Issue a `post` call. An absent payload is sent as `{}`.
    pub async fn post(
        &self,
        url: &str,
        data: Option<Value>,
        headers: Option<Headers>,
    ) -> ClientResult<ResponseEnvelope> {
        self.request(Verb::Post, url, data, headers).await
    }

    /// Issue a `put` call. An absent payload is sent as `{}`.
    pub async fn put(
        &self,
        url: &str,
        data: Option<Value>,
        headers: Option<Headers>,
    ) -> ClientResult<ResponseEnvelope> {
        self.request(Verb::Put, url, data, headers).await
    }

    /// Issue a `patch` call. An absent payload is sent as `{}`.
    pub async fn patch(
        &self,
        url: &str,
        data: Option<Value>,
        headers: Option<Headers>,
    ) -> ClientResult<ResponseEnvelope> {
        self.request(Verb::Patch, url, data, headers).await
    }

    /// Issue a `delete` call. An absent payload is sent as `{}`.
    pub async fn delete(
        &self,
        url: &str,
        data: Option<Value>,
        headers: Option<Headers>,
    ) -> ClientResult<ResponseEnvelope> {
        self.request(Verb::Delete, url, data, headers).await
    }

    /// Issue a call with any verb.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] when no connection exists; nothing is
    ///   emitted and no transform runs.
    /// - [`ClientError::Transform`] when a request or response stage fails.
    /// - [`ClientError::Classified`] when the classifier rejects the reply.
    /// - [`ClientError::Transport`] when emitting fails, the reply times out,
    ///   or the transport drops the reply without answering.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use sails_client::ClientBuilder;
    /// # use sails_transport_memory::MemoryTransport;
    /// use sails_transport_traits::Verb;
    ///
    /// # async fn example() -> sails_client::ClientResult<()> {
    /// # let client = ClientBuilder::new().with_auto_connect(true).build(MemoryTransport::new()).await?;
    /// let reply = client.request(Verb::from("subscribe"), "/room/1", None, None).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request(
        &self,
        verb: Verb,
        url: &str,
        data: Option<Value>,
        headers: Option<Headers>,
    ) -> ClientResult<ResponseEnvelope> {
        if !self.inner.connection.is_connected() {
            warn!(%verb, url, "Call attempted before connect");
            return Err(ClientError::NotConnected);
        }

        let data = normalize_payload(&verb, data);
        let config = RequestConfig {
            data,
            method: verb,
            url: url.to_string(),
            headers,
        };

        let config = self.inner.pipeline.run_request_stages(config).await?;
        let operation = format!("{} {}", config.method, config.url);

        let (data, meta) = self.exchange(config.into_transport_request(), &operation).await?;
        trace!(
            operation,
            status = ?meta.as_ref().and_then(|meta| meta.status_code),
            "Reply received"
        );

        let envelope = self.inner.classifier.classify(data, meta).await?;
        self.inner.pipeline.run_response_stages(envelope).await
    }

    /// Emit one request and wait for its single reply.
    async fn exchange(&self, request: TransportRequest, operation: &str) -> ClientResult<RawReply> {
        let Some(handle) = self.inner.connection.handle() else {
            warn!(operation, "Connection closed while preparing call");
            return Err(ClientError::NotConnected);
        };

        let (tx, rx) = oneshot::channel::<RawReply>();
        debug!(%handle, operation, "Emitting request");
        self.inner.connection.transport().invoke(
            &handle,
            request,
            Box::new(move |data, meta| {
                // The caller may have given up already.
                let _ = tx.send((data, meta));
            }),
        )?;

        let received = match self.inner.config.request_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, rx).await.map_err(|_| {
                warn!(operation, ?timeout, "Call timed out");
                TransportError::RequestTimeout {
                    operation: operation.to_string(),
                    timeout,
                }
            })?,
            None => rx.await,
        };

        received.map_err(|_| {
            warn!(operation, "Transport dropped the reply");
            ClientError::from(TransportError::ConnectionLost(format!(
                "no reply will arrive for {operation}"
            )))
        })
    }
}

/// Mutating verbs always carry an object payload.
fn normalize_payload(verb: &Verb, data: Option<Value>) -> Option<Value> {
    match data {
        None | Some(Value::Null) if verb.is_mutating() => Some(Value::Object(Map::new())),
        data => data,
    }
}
