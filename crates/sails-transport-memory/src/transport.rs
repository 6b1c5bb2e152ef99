//! In-memory socket transport implementation

use std::collections::HashMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, trace, warn};

use sails_transport_traits::{
    BoxFuture, ConnectionHandle, EventCallback, ReplyCallback, ResponseMeta, SocketOptions,
    SocketTransport, TransportError, TransportRequest, TransportResult,
};

/// Decides how the "server" answers one invocation.
pub type Responder = Arc<dyn Fn(&TransportRequest) -> Reply + Send + Sync>;

/// How an invocation is answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Call the reply callback right away with this payload and metadata.
    Respond {
        /// Reply payload
        data: Option<Value>,
        /// Reply metadata
        meta: Option<ResponseMeta>,
    },
    /// Keep the callback until [`MemoryTransport::release_pending`] is called.
    Silent,
    /// Drop the callback without calling it.
    Drop,
}

impl Reply {
    /// A `200` reply carrying `data`.
    pub fn ok(data: Option<Value>) -> Self {
        Self::status(200, data)
    }

    /// A reply with the given status code.
    pub fn status(status_code: i64, data: Option<Value>) -> Self {
        Self::Respond {
            data,
            meta: Some(ResponseMeta::with_status(status_code)),
        }
    }
}

/// One recorded call to [`SocketTransport::invoke`].
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Connection the request was emitted on
    pub handle: ConnectionHandle,
    /// The request as the transport received it
    pub request: TransportRequest,
}

struct Subscriber {
    event: String,
    callback: EventCallback,
    once: bool,
}

struct Connection {
    handle: ConnectionHandle,
    options: SocketOptions,
    subscribers: Vec<Subscriber>,
}

struct Inner {
    next_id: AtomicU64,
    connections: Mutex<HashMap<u64, Connection>>,
    opened: Mutex<Vec<ConnectionHandle>>,
    closed: Mutex<Vec<ConnectionHandle>>,
    invocations: Mutex<Vec<Invocation>>,
    pending: Mutex<VecDeque<ReplyCallback>>,
    responder: RwLock<Responder>,
    open_failure: Mutex<Option<TransportError>>,
}

/// In-process socket transport.
///
/// Cloning is cheap and every clone shares the same connections and records,
/// so a test can keep one clone while handing another to the client.
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("open_connections", &self.inner.connections.lock().len())
            .field("invocations", &self.inner.invocations.lock().len())
            .field("pending_replies", &self.inner.pending.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Create a transport that echoes each request payload back with status `200`.
    #[must_use]
    pub fn new() -> Self {
        let echo: Responder = Arc::new(|request: &TransportRequest| Reply::ok(request.data.clone()));
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                connections: Mutex::new(HashMap::new()),
                opened: Mutex::new(Vec::new()),
                closed: Mutex::new(Vec::new()),
                invocations: Mutex::new(Vec::new()),
                pending: Mutex::new(VecDeque::new()),
                responder: RwLock::new(echo),
                open_failure: Mutex::new(None),
            }),
        }
    }

    /// Replace the responder, builder style.
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: Fn(&TransportRequest) -> Reply + Send + Sync + 'static,
    {
        self.set_responder(responder);
        self
    }

    /// Replace the responder used for subsequent invocations.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&TransportRequest) -> Reply + Send + Sync + 'static,
    {
        *self.inner.responder.write() = Arc::new(responder);
    }

    /// Make the next [`open`](SocketTransport::open) fail with `error`.
    pub fn fail_next_open(&self, error: TransportError) {
        *self.inner.open_failure.lock() = Some(error);
    }

    /// Deliver an event to every matching subscriber on every open connection.
    ///
    /// Callbacks run synchronously, before this method returns. Once-subscribers
    /// are removed before they are called. Returns the number of callbacks run.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let callbacks: Vec<EventCallback> = {
            let mut connections = self.inner.connections.lock();
            let mut matched = Vec::new();
            for connection in connections.values_mut() {
                connection.subscribers.retain(|subscriber| {
                    if subscriber.event != event {
                        return true;
                    }
                    matched.push(Arc::clone(&subscriber.callback));
                    !subscriber.once
                });
            }
            matched
        };

        trace!(event, subscribers = callbacks.len(), "Delivering event");
        for callback in &callbacks {
            callback(payload.clone());
        }
        callbacks.len()
    }

    /// Answer the oldest withheld invocation. Returns `false` if none was pending.
    pub fn release_pending(&self, data: Option<Value>, meta: Option<ResponseMeta>) -> bool {
        let reply = self.inner.pending.lock().pop_front();
        match reply {
            Some(reply) => {
                reply(data, meta);
                true
            }
            None => false,
        }
    }

    /// Number of withheld replies.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Every invocation received so far, oldest first.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.inner.invocations.lock().clone()
    }

    /// Number of invocations received so far.
    pub fn invocation_count(&self) -> usize {
        self.inner.invocations.lock().len()
    }

    /// The most recent invocation, if any.
    pub fn last_invocation(&self) -> Option<Invocation> {
        self.inner.invocations.lock().last().cloned()
    }

    /// Every handle ever opened, oldest first.
    pub fn opened(&self) -> Vec<ConnectionHandle> {
        self.inner.opened.lock().clone()
    }

    /// Every handle ever closed, oldest first.
    pub fn closed(&self) -> Vec<ConnectionHandle> {
        self.inner.closed.lock().clone()
    }

    /// Handles of the connections that are currently open.
    pub fn open_connections(&self) -> Vec<ConnectionHandle> {
        let mut handles: Vec<_> = self
            .inner
            .connections
            .lock()
            .values()
            .map(|connection| connection.handle.clone())
            .collect();
        handles.sort_by_key(ConnectionHandle::id);
        handles
    }

    /// Options a connection was opened with.
    pub fn options_for(&self, handle: &ConnectionHandle) -> Option<SocketOptions> {
        self.inner
            .connections
            .lock()
            .get(&handle.id())
            .map(|connection| connection.options.clone())
    }

    /// Number of live subscribers for `event` across all open connections.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner
            .connections
            .lock()
            .values()
            .flat_map(|connection| connection.subscribers.iter())
            .filter(|subscriber| subscriber.event == event)
            .count()
    }

    fn add_subscriber(
        &self,
        handle: &ConnectionHandle,
        event: &str,
        callback: EventCallback,
        once: bool,
    ) -> TransportResult<()> {
        let mut connections = self.inner.connections.lock();
        let connection = connections
            .get_mut(&handle.id())
            .ok_or(TransportError::UnknownHandle(handle.id()))?;
        debug!(%handle, event, once, "Registering subscriber");
        connection.subscribers.push(Subscriber {
            event: event.to_string(),
            callback,
            once,
        });
        Ok(())
    }
}

impl SocketTransport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn open<'a>(
        &'a self,
        address: &'a str,
        options: &'a SocketOptions,
    ) -> BoxFuture<'a, TransportResult<ConnectionHandle>> {
        Box::pin(async move {
            if let Some(error) = self.inner.open_failure.lock().take() {
                warn!(address, "Refusing connection: {}", error);
                return Err(error);
            }

            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            let handle = ConnectionHandle::new(id, address);
            self.inner.connections.lock().insert(
                id,
                Connection {
                    handle: handle.clone(),
                    options: options.clone(),
                    subscribers: Vec::new(),
                },
            );
            self.inner.opened.lock().push(handle.clone());
            debug!(%handle, "Opened in-memory connection");
            Ok(handle)
        })
    }

    fn close<'a>(&'a self, handle: &'a ConnectionHandle) -> BoxFuture<'a, TransportResult<()>> {
        Box::pin(async move {
            self.inner
                .connections
                .lock()
                .remove(&handle.id())
                .ok_or(TransportError::UnknownHandle(handle.id()))?;
            self.inner.closed.lock().push(handle.clone());
            debug!(%handle, "Closed in-memory connection");
            Ok(())
        })
    }

    fn invoke(
        &self,
        handle: &ConnectionHandle,
        request: TransportRequest,
        reply: ReplyCallback,
    ) -> TransportResult<()> {
        if !self.inner.connections.lock().contains_key(&handle.id()) {
            return Err(TransportError::UnknownHandle(handle.id()));
        }

        trace!(%handle, verb = %request.verb, url = %request.url, "Invocation received");
        self.inner.invocations.lock().push(Invocation {
            handle: handle.clone(),
            request: request.clone(),
        });

        let responder = Arc::clone(&*self.inner.responder.read());
        match responder(&request) {
            Reply::Respond { data, meta } => reply(data, meta),
            Reply::Silent => self.inner.pending.lock().push_back(reply),
            Reply::Drop => drop(reply),
        }
        Ok(())
    }

    fn subscribe(
        &self,
        handle: &ConnectionHandle,
        event: &str,
        callback: EventCallback,
    ) -> TransportResult<()> {
        self.add_subscriber(handle, event, callback, false)
    }

    fn subscribe_once(
        &self,
        handle: &ConnectionHandle,
        event: &str,
        callback: EventCallback,
    ) -> TransportResult<()> {
        self.add_subscriber(handle, event, callback, true)
    }
}
