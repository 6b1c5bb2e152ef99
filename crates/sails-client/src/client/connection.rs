//! Connection lifecycle, readiness and subscription registration
//!
//! The [`ConnectionManager`] owns at most one transport handle at a time and a
//! readiness signal for the current connection cycle. A cycle starts when the
//! previous one was torn down (or at construction) and ends with the next
//! `disconnect`.
//!
//! Subscriptions made while disconnected are queued on the cycle and handed to
//! the transport by `connect` itself, before the handle becomes visible. Once
//! `connect` returns, every queued subscription is live.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, oneshot, watch};
use tracing::{debug, info, warn};

use sails_transport_traits::{
    ConnectionHandle, EventCallback, SocketOptions, SocketTransport, TransportError,
    TransportResult,
};

/// Whether a transport handle currently exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No handle; verb calls fail fast and subscriptions wait.
    Disconnected,
    /// A handle exists and calls go through it.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connected => f.write_str("connected"),
        }
    }
}

/// How often a subscription fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// Every occurrence of the event
    On,
    /// The next occurrence only
    Once,
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Once => f.write_str("once"),
        }
    }
}

/// Resolves with the transport's answer once a subscription is registered.
///
/// The sender is dropped without an answer when the cycle it was queued on is
/// abandoned.
pub type RegistrationReceiver = oneshot::Receiver<TransportResult<()>>;

/// Readiness of one connection cycle.
///
/// Resolves at most once, with that cycle's handle. Dropping it is harmless.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<Option<ConnectionHandle>>,
}

impl ReadySignal {
    /// Wait until the cycle connects.
    ///
    /// Returns `None` if the cycle can no longer resolve because the manager
    /// was dropped.
    pub async fn wait(mut self) -> Option<ConnectionHandle> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(handle) => handle.clone(),
            Err(_) => None,
        }
    }

    /// Returns `true` once the cycle has connected.
    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

struct PendingSubscription {
    kind: SubscriptionKind,
    event: String,
    callback: EventCallback,
    done: oneshot::Sender<TransportResult<()>>,
}

struct Slot {
    handle: Option<ConnectionHandle>,
    ready: watch::Sender<Option<ConnectionHandle>>,
    pending: Vec<PendingSubscription>,
}

impl Slot {
    fn unresolved() -> Self {
        let (ready, _) = watch::channel(None);
        Self {
            handle: None,
            ready,
            pending: Vec::new(),
        }
    }
}

/// Owns the transport handle, the per-cycle readiness signal and the
/// subscriptions waiting for that cycle.
///
/// Readers (`handle`, `is_connected`, `ready`) never block on I/O. `connect`
/// and `disconnect` are serialized against each other so two callers cannot
/// open two connections. Transport `subscribe` calls are made under the slot
/// lock and must not call back into the client.
pub struct ConnectionManager<T: SocketTransport> {
    transport: Arc<T>,
    address: String,
    options: SocketOptions,
    slot: RwLock<Slot>,
    lifecycle: Mutex<()>,
}

impl<T: SocketTransport> fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("transport", &self.transport.name())
            .field("address", &self.address)
            .field("handle", &self.slot.read().handle)
            .finish_non_exhaustive()
    }
}

impl<T: SocketTransport> ConnectionManager<T> {
    /// Create a disconnected manager with an unresolved readiness signal.
    pub fn new(transport: Arc<T>, address: impl Into<String>, options: SocketOptions) -> Self {
        Self {
            transport,
            address: address.into(),
            options,
            slot: RwLock::new(Slot::unresolved()),
            lifecycle: Mutex::new(()),
        }
    }

    /// The transport this manager opens connections on.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Address handed to the transport on connect.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Open a connection, register the cycle's queued subscriptions and
    /// resolve the current readiness signal.
    ///
    /// A no-op when already connected. A subscription the transport refuses is
    /// reported on its own receiver and does not fail the connect. Fails with the transport's error, or
    /// with `ConnectionFailed` when `connect_timeout_ms` elapses first; the
    /// manager stays disconnected and the signal stays pending either way.
    pub async fn connect(&self) -> TransportResult<()> {
        let _lifecycle = self.lifecycle.lock().await;

        if let Some(handle) = self.handle() {
            warn!(%handle, "connect() called while already connected, ignoring");
            return Ok(());
        }

        let timeout = self.options.connect_timeout();
        debug!(
            transport = self.transport.name(),
            address = %self.address,
            "Opening connection"
        );
        let handle =
            match tokio::time::timeout(timeout, self.transport.open(&self.address, &self.options))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(TransportError::ConnectionFailed(format!(
                        "connecting to {} timed out after {:?}",
                        self.address, timeout
                    )));
                }
            };

        let registered = {
            let mut slot = self.slot.write();
            let pending = std::mem::take(&mut slot.pending);
            let count = pending.len();
            for subscription in pending {
                let result = self.register(
                    &handle,
                    subscription.kind,
                    &subscription.event,
                    subscription.callback,
                );
                let _ = subscription.done.send(result);
            }
            slot.handle = Some(handle.clone());
            slot.ready.send_replace(Some(handle.clone()));
            count
        };
        info!(%handle, queued_subscriptions = registered, "Connected");
        Ok(())
    }

    /// Close the connection and start a new, unresolved readiness cycle with an
    /// empty subscription queue.
    ///
    /// A no-op when not connected; the pending signal and queue are kept. The handle is
    /// cleared before the transport is asked to close it, and a failing close
    /// is reported without undoing that.
    pub async fn disconnect(&self) -> TransportResult<()> {
        let _lifecycle = self.lifecycle.lock().await;

        let handle = {
            let mut slot = self.slot.write();
            let Some(handle) = slot.handle.take() else {
                warn!("disconnect() called while not connected, ignoring");
                return Ok(());
            };
            *slot = Slot::unresolved();
            handle
        };

        debug!(%handle, "Closing connection");
        self.transport.close(&handle).await?;
        info!(%handle, "Disconnected");
        Ok(())
    }

    /// Register `callback` for `event` on the live connection, or queue it for
    /// the current cycle's `connect`.
    ///
    /// When connected the registration has happened by the time this returns.
    pub fn subscribe(
        &self,
        kind: SubscriptionKind,
        event: impl Into<String>,
        callback: EventCallback,
    ) -> RegistrationReceiver {
        let event = event.into();
        let (done, receiver) = oneshot::channel();

        let mut slot = self.slot.write();
        match slot.handle.clone() {
            Some(handle) => {
                let _ = done.send(self.register(&handle, kind, &event, callback));
            }
            None => {
                debug!(event, %kind, "Not connected, queueing subscription");
                slot.pending.push(PendingSubscription {
                    kind,
                    event,
                    callback,
                    done,
                });
            }
        }
        receiver
    }

    /// Number of subscriptions queued for the current cycle.
    pub fn queued_subscriptions(&self) -> usize {
        self.slot.read().pending.len()
    }

    fn register(
        &self,
        handle: &ConnectionHandle,
        kind: SubscriptionKind,
        event: &str,
        callback: EventCallback,
    ) -> TransportResult<()> {
        let result = match kind {
            SubscriptionKind::On => self.transport.subscribe(handle, event, callback),
            SubscriptionKind::Once => self.transport.subscribe_once(handle, event, callback),
        };
        match &result {
            Ok(()) => debug!(%handle, event, %kind, "Subscription registered"),
            Err(error) => warn!(%handle, event, %kind, "Subscription failed: {}", error),
        }
        result
    }

    /// The current handle, if connected.
    pub fn handle(&self) -> Option<ConnectionHandle> {
        self.slot.read().handle.clone()
    }

    /// Returns `true` while a handle exists.
    pub fn is_connected(&self) -> bool {
        self.slot.read().handle.is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Readiness signal of the current cycle.
    pub fn ready(&self) -> ReadySignal {
        ReadySignal {
            rx: self.slot.read().ready.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sails_transport_memory::MemoryTransport;
    use std::time::Duration;

    fn manager() -> (MemoryTransport, ConnectionManager<MemoryTransport>) {
        let transport = MemoryTransport::new();
        let manager = ConnectionManager::new(
            Arc::new(transport.clone()),
            "localhost:1337",
            SocketOptions::default(),
        );
        (transport, manager)
    }

    #[tokio::test]
    async fn test_ready_resolves_with_cycle_handle() {
        let (transport, manager) = manager();
        let ready = manager.ready();
        assert!(!ready.is_ready());
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.connect().await.unwrap();
        let handle = ready.wait().await.unwrap();
        assert_eq!(transport.opened(), vec![handle.clone()]);
        assert_eq!(manager.handle(), Some(handle));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_connect_twice_is_noop() {
        let (transport, manager) = manager();
        manager.connect().await.unwrap();
        manager.connect().await.unwrap();
        assert_eq!(transport.opened().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_installs_fresh_signal() {
        let (transport, manager) = manager();
        manager.connect().await.unwrap();
        assert!(manager.ready().is_ready());

        manager.disconnect().await.unwrap();
        assert!(!manager.is_connected());
        let next = manager.ready();
        assert!(!next.is_ready());
        assert_eq!(transport.closed().len(), 1);

        manager.connect().await.unwrap();
        let handle = next.wait().await.unwrap();
        assert_eq!(transport.opened()[1], handle);
    }

    #[tokio::test]
    async fn test_disconnect_while_disconnected_keeps_signal() {
        let (transport, manager) = manager();
        let ready = manager.ready();
        manager.disconnect().await.unwrap();
        assert!(transport.closed().is_empty());

        manager.connect().await.unwrap();
        assert!(ready.wait().await.is_some());
    }

    #[tokio::test]
    async fn test_failed_open_stays_disconnected() {
        let (transport, manager) = manager();
        transport.fail_next_open(TransportError::ConnectionFailed("refused".into()));
        let ready = manager.ready();

        let err = manager.connect().await.unwrap_err();
        assert!(err.is_connection_error());
        assert!(!manager.is_connected());
        assert!(!ready.is_ready());

        manager.connect().await.unwrap();
        assert!(ready.wait().await.is_some());
    }

    fn noop() -> EventCallback {
        Arc::new(|_: serde_json::Value| {})
    }

    #[tokio::test]
    async fn test_connect_registers_queued_subscriptions() {
        let (transport, manager) = manager();
        let on = manager.subscribe(SubscriptionKind::On, "user", noop());
        let once = manager.subscribe(SubscriptionKind::Once, "user", noop());
        assert_eq!(manager.queued_subscriptions(), 2);
        assert_eq!(transport.subscriber_count("user"), 0);

        manager.connect().await.unwrap();
        assert_eq!(manager.queued_subscriptions(), 0);
        assert_eq!(transport.subscriber_count("user"), 2);
        on.await.unwrap().unwrap();
        once.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_while_connected_registers_inline() {
        let (transport, manager) = manager();
        manager.connect().await.unwrap();

        let mut registered = manager.subscribe(SubscriptionKind::On, "tick", noop());
        assert_eq!(transport.subscriber_count("tick"), 1);
        assert_eq!(manager.queued_subscriptions(), 0);
        registered.try_recv().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_queue_survives_noop_disconnect() {
        let (transport, manager) = manager();
        manager.connect().await.unwrap();
        manager.disconnect().await.unwrap();

        let registered = manager.subscribe(SubscriptionKind::On, "user", noop());
        assert_eq!(manager.queued_subscriptions(), 1);
        // Not connected: the queue survives a no-op disconnect
        manager.disconnect().await.unwrap();
        assert_eq!(manager.queued_subscriptions(), 1);

        manager.connect().await.unwrap();
        registered.await.unwrap().unwrap();
        assert_eq!(transport.subscriber_count("user"), 1);
    }

    #[tokio::test]
    async fn test_dropped_manager_abandons_queue() {
        let (_transport, manager) = manager();
        let registered = manager.subscribe(SubscriptionKind::On, "user", noop());
        drop(manager);
        assert!(registered.await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_manager_releases_waiters() {
        let (_transport, manager) = manager();
        let ready = manager.ready();
        drop(manager);
        let outcome = tokio::time::timeout(Duration::from_secs(1), ready.wait())
            .await
            .unwrap();
        assert_eq!(outcome, None);
    }
}
