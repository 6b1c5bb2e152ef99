//! Core `Client<T>` type
//!
//! `Client<T>` is a cheap `Arc` wrapper; every clone shares one connection,
//! one pipeline and one scheduler. Verb calls live in
//! [`operations::verbs`](super::operations::verbs) and subscriptions in
//! [`operations::events`](super::operations::events).

use std::fmt;
use std::sync::Arc;

use sails_transport_traits::SocketTransport;

use super::config::ClientConfig;
use super::connection::{ConnectionManager, ConnectionState};
use crate::classifier::ResponseClassifier;
use crate::error::ClientResult;
use crate::pipeline::TransformPipeline;
use crate::scheduler::Scheduler;

/// Shared client state. Nothing in here changes after `build`, apart from the
/// connection manager's own interior state.
pub(super) struct ClientInner<T: SocketTransport + 'static> {
    pub(super) config: ClientConfig,
    pub(super) connection: ConnectionManager<T>,
    pub(super) pipeline: Arc<TransformPipeline>,
    pub(super) classifier: Arc<dyn ResponseClassifier>,
    pub(super) scheduler: Arc<dyn Scheduler>,
}

/// Promise-style socket client.
///
/// Build one with [`ClientBuilder`], connect it, then issue verb calls and
/// register event subscriptions.
///
/// ```rust,no_run
/// use sails_client::ClientBuilder;
/// use sails_transport_memory::MemoryTransport;
///
/// # async fn example() -> sails_client::ClientResult<()> {
/// let client = ClientBuilder::new()
///     .with_address("localhost:1337")
///     .build(MemoryTransport::new())
///     .await?;
///
/// client.on("message", |payload| println!("message: {payload}"));
/// client.connect().await?;
///
/// let reply = client.post("/messages", Some(serde_json::json!({"text": "hi"})), None).await?;
/// println!("status: {:?}", reply.status_code());
///
/// // Cheap clone, same connection
/// let other = client.clone();
/// tokio::spawn(async move { other.get("/messages", None, None).await });
/// # Ok(())
/// # }
/// ```
pub struct Client<T: SocketTransport + 'static> {
    pub(super) inner: Arc<ClientInner<T>>,
}

impl<T: SocketTransport + 'static> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: SocketTransport + 'static> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.inner.connection)
            .field("pipeline", &self.inner.pipeline)
            .field("classifier", &self.inner.classifier)
            .field("scheduler", &self.inner.scheduler)
            .finish_non_exhaustive()
    }
}

impl<T: SocketTransport + 'static> Client<T> {
    /// Open the connection, register subscriptions queued while disconnected
    /// and release everything waiting on readiness.
    ///
    /// Calling this while connected does nothing.
    pub async fn connect(&self) -> ClientResult<()> {
        Ok(self.inner.connection.connect().await?)
    }

    /// Close the connection. Calling this while disconnected does nothing.
    ///
    /// Subscriptions made on the closed connection are gone; register them
    /// again after reconnecting if they are still wanted.
    pub async fn disconnect(&self) -> ClientResult<()> {
        Ok(self.inner.connection.disconnect().await?)
    }

    /// Returns `true` while connected.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The transform pipeline, fixed at build time.
    pub fn pipeline(&self) -> &TransformPipeline {
        &self.inner.pipeline
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        self.inner.connection.transport()
    }
}
