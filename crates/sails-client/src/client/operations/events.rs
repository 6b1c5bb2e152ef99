//! Event subscriptions
//!
//! Subscriptions can be made at any time. While connected they are registered
//! with the transport before `on`/`once` returns. While disconnected they are
//! queued on the current connection cycle, and the `connect` that opens it
//! registers them before it returns.
//!
//! Delivered payloads never reach the application callback on the transport's
//! delivery path: the relay hands each one to the client's
//! [`Scheduler`](crate::Scheduler).

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use sails_transport_traits::{EventCallback, SocketTransport};

use super::super::connection::{RegistrationReceiver, SubscriptionKind};
use crate::error::{ClientError, ClientResult};
use crate::scheduler::Scheduler;

/// A queued or completed registration.
///
/// Dropping it does not cancel the registration.
#[derive(Debug)]
pub struct Subscription {
    event: String,
    kind: SubscriptionKind,
    outcome: Option<RegistrationReceiver>,
}

impl Subscription {
    /// Event name this subscription listens for.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether it fires every time or once.
    pub fn kind(&self) -> SubscriptionKind {
        self.kind
    }

    /// Wait until the callback is registered with the transport.
    ///
    /// Only needed to observe a refused registration; events are never lost
    /// for lack of awaiting this. Resolves `Ok` right away for a subscription
    /// made without a callback, and when the client was dropped before it ever
    /// connected.
    pub async fn registered(self) -> ClientResult<()> {
        let Some(outcome) = self.outcome else {
            return Ok(());
        };
        match outcome.await {
            Ok(result) => result.map_err(ClientError::from),
            Err(_) => {
                debug!(event = self.event, "Connection cycle abandoned before registration");
                Ok(())
            }
        }
    }
}

impl<T: SocketTransport + 'static> super::super::core::Client<T> {
    /// Call `callback` with the payload of every `event` delivered on the
    /// connection.
    ///
    /// ```rust,no_run
    /// # use sails_client::ClientBuilder;
    /// # use sails_transport_memory::MemoryTransport;
    /// # async fn example() -> sails_client::ClientResult<()> {
    /// let client = ClientBuilder::new().build(MemoryTransport::new()).await?;
    ///
    /// // Registered by the time connect() returns
    /// client.on("message", |payload| println!("got {payload}"));
    /// client.connect().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscribe(SubscriptionKind::On, event, Some(Arc::new(callback)))
    }

    /// Call `callback` with the payload of the next `event` only.
    pub fn once<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscribe(SubscriptionKind::Once, event, Some(Arc::new(callback)))
    }

    /// Register `callback` for `event` now if connected, otherwise when the
    /// current connection cycle connects.
    ///
    /// Never blocks and never fails synchronously; a refused registration is
    /// reported by [`Subscription::registered`]. Without a callback this is a
    /// no-op.
    pub fn subscribe(
        &self,
        kind: SubscriptionKind,
        event: impl Into<String>,
        callback: Option<EventCallback>,
    ) -> Subscription {
        let event = event.into();
        let Some(callback) = callback else {
            debug!(event, %kind, "Subscription without a callback, ignoring");
            return Subscription {
                event,
                kind,
                outcome: None,
            };
        };

        let relay = relay(&event, callback, Arc::clone(&self.inner.scheduler));
        let outcome = self.inner.connection.subscribe(kind, event.clone(), relay);

        Subscription {
            event,
            kind,
            outcome: Some(outcome),
        }
    }
}

/// Wrap `callback` so each delivery is deferred through `scheduler`.
fn relay(event: &str, callback: EventCallback, scheduler: Arc<dyn Scheduler>) -> EventCallback {
    let event = event.to_string();
    Arc::new(move |payload: Value| {
        trace!(event, "Relaying event to scheduler");
        let callback = Arc::clone(&callback);
        scheduler.defer(Box::new(move || callback(payload)));
    })
}
