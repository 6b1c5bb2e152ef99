//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::time::Duration;

use parking_lot::Mutex;
use sails_client::{Client, ClientBuilder, Scheduler, Task};
use sails_transport_memory::MemoryTransport;
use serde_json::Value;
use tokio::sync::mpsc;

/// Route client logs to the test harness. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build and connect a client over `transport` with default settings.
pub async fn connected_client(transport: &MemoryTransport) -> Client<MemoryTransport> {
    init_tracing();
    let client = ClientBuilder::new()
        .build(transport.clone())
        .await
        .expect("client should build");
    client.connect().await.expect("memory transport should connect");
    client
}

/// An event sink: a callback plus the receiving end of what it saw.
pub fn event_sink() -> (
    impl Fn(Value) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<Value>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = move |payload: Value| {
        let _ = tx.send(payload);
    };
    (callback, rx)
}

/// Wait for the next delivered payload, failing the test after one second.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event should be delivered")
        .expect("sink should stay open")
}

/// Assert nothing more arrives within a short window. A sink whose callback
/// was dropped by the transport counts as quiet.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Value>) {
    let extra = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(
        !matches!(extra, Ok(Some(_))),
        "unexpected extra delivery: {extra:?}"
    );
}

/// Scheduler that only queues tasks; the test decides when they run.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<Task>>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("queued", &self.queued())
            .finish()
    }
}

impl ManualScheduler {
    /// Number of queued tasks.
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run every queued task, returning how many ran.
    pub fn run_all(&self) -> usize {
        let tasks: Vec<Task> = self.queue.lock().drain(..).collect();
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, task: Task) {
        self.queue.lock().push(task);
    }
}
