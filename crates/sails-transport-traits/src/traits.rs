//! Core transport trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::config::SocketOptions;
use crate::error::TransportResult;
use crate::types::{ConnectionHandle, ResponseMeta, TransportRequest};

/// Boxed, sendable future returned by the asynchronous transport operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Receives the single `(payload, meta)` reply of an invocation.
///
/// A transport calls it at most once. Dropping it without calling it tells the
/// caller that no reply will ever arrive.
pub type ReplyCallback = Box<dyn FnOnce(Option<Value>, Option<ResponseMeta>) + Send + 'static>;

/// Receives the payload of every delivered event.
pub type EventCallback = Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// The bidirectional socket primitive the client is built on.
///
/// A transport may hold several connections at once; each is named by the
/// [`ConnectionHandle`] returned from [`open`](Self::open). Callbacks may be
/// invoked from any thread, including synchronously from inside
/// [`invoke`](Self::invoke) or the transport's own delivery path.
pub trait SocketTransport: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "socket"
    }

    /// Establishes one logical connection.
    fn open<'a>(
        &'a self,
        address: &'a str,
        options: &'a SocketOptions,
    ) -> BoxFuture<'a, TransportResult<ConnectionHandle>>;

    /// Tears down a connection. Subscriptions made on it are dropped.
    fn close<'a>(&'a self, handle: &'a ConnectionHandle) -> BoxFuture<'a, TransportResult<()>>;

    /// Emits a request and arranges for `reply` to receive its answer.
    ///
    /// An `Err` means nothing was emitted and `reply` has been dropped.
    fn invoke(
        &self,
        handle: &ConnectionHandle,
        request: TransportRequest,
        reply: ReplyCallback,
    ) -> TransportResult<()>;

    /// Registers `callback` for every future occurrence of `event`.
    fn subscribe(
        &self,
        handle: &ConnectionHandle,
        event: &str,
        callback: EventCallback,
    ) -> TransportResult<()>;

    /// Registers `callback` for the next occurrence of `event` only.
    fn subscribe_once(
        &self,
        handle: &ConnectionHandle,
        event: &str,
        callback: EventCallback,
    ) -> TransportResult<()>;
}

impl<T: SocketTransport + ?Sized> SocketTransport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open<'a>(
        &'a self,
        address: &'a str,
        options: &'a SocketOptions,
    ) -> BoxFuture<'a, TransportResult<ConnectionHandle>> {
        (**self).open(address, options)
    }

    fn close<'a>(&'a self, handle: &'a ConnectionHandle) -> BoxFuture<'a, TransportResult<()>> {
        (**self).close(handle)
    }

    fn invoke(
        &self,
        handle: &ConnectionHandle,
        request: TransportRequest,
        reply: ReplyCallback,
    ) -> TransportResult<()> {
        (**self).invoke(handle, request, reply)
    }

    fn subscribe(
        &self,
        handle: &ConnectionHandle,
        event: &str,
        callback: EventCallback,
    ) -> TransportResult<()> {
        (**self).subscribe(handle, event, callback)
    }

    fn subscribe_once(
        &self,
        handle: &ConnectionHandle,
        event: &str,
        callback: EventCallback,
    ) -> TransportResult<()> {
        (**self).subscribe_once(handle, event, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait can be used as a trait object
    fn _test_transport_object(_t: &dyn SocketTransport) {}
    fn _test_arc_dyn_is_transport(t: Arc<dyn SocketTransport>) -> impl SocketTransport {
        t
    }
}
