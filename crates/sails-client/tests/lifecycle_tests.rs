//! Connection lifecycle and configuration tests

mod common;

use std::io::Write;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sails_client::{
    ClientBuilder, ClientConfig, ClientError, ConnectionState, SocketOptions, TransportError,
};
use sails_transport_memory::MemoryTransport;
use sails_transport_traits::{
    BoxFuture, ConnectionHandle, EventCallback, ReplyCallback, SocketTransport, TransportRequest,
    TransportResult,
};
use serde_json::json;

use common::{connected_client, init_tracing};

#[tokio::test]
async fn test_connect_is_idempotent() {
    let transport = MemoryTransport::new();
    let client = connected_client(&transport).await;

    client.connect().await.unwrap();
    assert_eq!(transport.opened().len(), 1);
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_disconnect_while_disconnected_is_noop() {
    let transport = MemoryTransport::new();
    let client = ClientBuilder::new().build(transport.clone()).await.unwrap();

    client.disconnect().await.unwrap();
    assert!(transport.closed().is_empty());
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_calls_fail_after_disconnect_and_resume_after_reconnect() {
    let transport = MemoryTransport::new();
    let client = connected_client(&transport).await;

    client.get("/a", None, None).await.unwrap();
    client.disconnect().await.unwrap();
    assert!(!client.is_connected());

    let err = client.get("/a", None, None).await.unwrap_err();
    assert!(err.is_not_connected());
    assert_eq!(transport.invocation_count(), 1);

    client.connect().await.unwrap();
    client.get("/a", None, None).await.unwrap();

    let opened = transport.opened();
    assert_eq!(opened.len(), 2);
    assert_ne!(opened[0], opened[1]);
    assert_eq!(transport.closed(), vec![opened[0].clone()]);
    assert_eq!(transport.last_invocation().unwrap().handle, opened[1]);
}

#[tokio::test]
async fn test_connect_failure_leaves_client_disconnected() {
    init_tracing();
    let transport = MemoryTransport::new();
    let client = ClientBuilder::new().build(transport.clone()).await.unwrap();

    transport.fail_next_open(TransportError::ConnectionFailed("refused".into()));
    let err = client.connect().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transport(TransportError::ConnectionFailed(_))
    ));
    assert_eq!(client.state(), ConnectionState::Disconnected);

    client.connect().await.unwrap();
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_options_reach_transport() {
    let transport = MemoryTransport::new();
    let options = SocketOptions::default()
        .with_query("__sails_io_sdk_version", "0.13.8")
        .with_header("cookie", "sails.sid=abc");
    let client = ClientBuilder::new()
        .with_address("api.example.com:443")
        .with_options(options.clone())
        .build(transport.clone())
        .await
        .unwrap();
    client.connect().await.unwrap();

    let handle = transport.opened()[0].clone();
    assert_eq!(handle.address(), "api.example.com:443");
    assert_eq!(transport.options_for(&handle), Some(options));
}

#[tokio::test]
async fn test_clones_share_connection() {
    let transport = MemoryTransport::new();
    let client = ClientBuilder::new().build(transport.clone()).await.unwrap();
    let other = client.clone();

    client.connect().await.unwrap();
    assert!(other.is_connected());

    other.post("/a", Some(json!({"n": 1})), None).await.unwrap();
    assert_eq!(transport.invocation_count(), 1);

    other.disconnect().await.unwrap();
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_concurrent_connects_open_once() {
    let transport = MemoryTransport::new();
    let client = ClientBuilder::new().build(transport.clone()).await.unwrap();

    let (a, b) = tokio::join!(client.connect(), client.connect());
    a.unwrap();
    b.unwrap();
    assert_eq!(transport.opened().len(), 1);
}

/// A transport whose `open` never completes.
#[derive(Debug)]
struct StalledTransport;

impl SocketTransport for StalledTransport {
    fn open<'a>(
        &'a self,
        _address: &'a str,
        _options: &'a SocketOptions,
    ) -> BoxFuture<'a, TransportResult<ConnectionHandle>> {
        Box::pin(std::future::pending())
    }

    fn close<'a>(&'a self, _handle: &'a ConnectionHandle) -> BoxFuture<'a, TransportResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn invoke(
        &self,
        handle: &ConnectionHandle,
        _request: TransportRequest,
        _reply: ReplyCallback,
    ) -> TransportResult<()> {
        Err(TransportError::UnknownHandle(handle.id()))
    }

    fn subscribe(
        &self,
        handle: &ConnectionHandle,
        _event: &str,
        _callback: EventCallback,
    ) -> TransportResult<()> {
        Err(TransportError::UnknownHandle(handle.id()))
    }

    fn subscribe_once(
        &self,
        handle: &ConnectionHandle,
        _event: &str,
        _callback: EventCallback,
    ) -> TransportResult<()> {
        Err(TransportError::UnknownHandle(handle.id()))
    }
}

#[tokio::test]
async fn test_connect_timeout() {
    let options = SocketOptions {
        connect_timeout_ms: 20,
        ..SocketOptions::default()
    };
    let client = ClientBuilder::new()
        .with_options(options)
        .build(StalledTransport)
        .await
        .unwrap();

    let err = client.connect().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transport(TransportError::ConnectionFailed(_))
    ));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_shared_transport_object() {
    let memory = MemoryTransport::new();
    let transport: Arc<dyn SocketTransport> = Arc::new(memory.clone());
    let client = ClientBuilder::new().build(transport).await.unwrap();
    client.connect().await.unwrap();

    client.get("/a", None, None).await.unwrap();
    assert_eq!(memory.invocation_count(), 1);
    assert_eq!(client.transport().name(), "memory");
}

#[tokio::test]
async fn test_client_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "address: \"files.example.com:1337\"\nauto_connect: true\nrequest_timeout_ms: 750"
    )
    .unwrap();

    let config = ClientConfig::from_file_with_prefix(file.path(), "SAILS_LIFECYCLE_TEST").unwrap();
    let transport = MemoryTransport::new();
    let client = ClientBuilder::from_config(config)
        .build(transport.clone())
        .await
        .unwrap();

    assert!(client.is_connected());
    assert_eq!(transport.opened()[0].address(), "files.example.com:1337");
    assert_eq!(client.config().request_timeout_ms, Some(750));
}
