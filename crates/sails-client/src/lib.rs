//! # Sails Client
//!
//! Promise-style client for a Sails-style socket server: verb calls that
//! resolve with the reply or fail with a typed error, event subscriptions that
//! can be made before the connection exists, and ordered request/response
//! transforms.
//!
//! ## Features
//!
//! - Verb calls (`get`, `post`, `put`, `patch`, `delete`, or any verb via `request`)
//! - Pluggable response classification (default: non-`2xx` status is a failure)
//! - Request and response transform stages, run in registration order
//! - Subscriptions made before `connect` are live by the time it returns
//! - Event callbacks always run on a later scheduler tick, never on the transport's stack
//! - Transport-agnostic (works with any [`SocketTransport`] implementation)
//!
//! ## Architecture
//!
//! ```text
//! Application
//!      ↓
//! Client (verbs, events)         ← this crate
//!      ↓
//! TransformPipeline → ResponseClassifier
//!      ↓
//! ConnectionManager (handle, readiness, queued subscriptions)
//!      ↓
//! SocketTransport (sails-transport-traits)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sails_client::prelude::*;
//! use sails_transport_memory::MemoryTransport;
//!
//! # async fn example() -> ClientResult<()> {
//! let client = ClientBuilder::new()
//!     .with_address("localhost:1337")
//!     .with_request_transform(map_request("trace", |mut config| {
//!         config.insert_data("traceId", serde_json::json!("abc"));
//!         config
//!     }))
//!     .build(MemoryTransport::new())
//!     .await?;
//!
//! client.on("user", |payload| println!("user event: {payload}"));
//! client.connect().await?;
//!
//! match client.get("/user/1", None, None).await {
//!     Ok(reply) => println!("user: {:?}", reply.data),
//!     Err(e) if e.kind() == ErrorKind::ClassifiedFailure => {
//!         println!("rejected with {:?}", e.envelope().and_then(|r| r.status_code()));
//!     }
//!     Err(e) => eprintln!("call failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod classifier;
pub mod client;
pub mod error;
pub mod pipeline;
pub mod scheduler;
pub mod types;

pub use classifier::{FnClassifier, ResponseClassifier, StatusCodeClassifier, classifier_fn};
pub use client::{
    Client, ClientBuilder, ClientConfig, ConnectionManager, ConnectionState, ReadySignal,
    Subscription, SubscriptionKind,
};
pub use error::{BoxError, ClientError, ClientResult, ConfigError, ErrorKind};
pub use pipeline::{RequestTransform, ResponseTransform, TransformPipeline};
pub use scheduler::{Scheduler, Task, TokioScheduler};
pub use types::{RequestConfig, ResponseEnvelope};

pub use sails_transport_traits::{
    ConnectionHandle, EventCallback, Headers, ResponseMeta, SocketOptions, SocketTransport,
    TransportError, Verb,
};

/// Everything needed to build a client and write transforms.
pub mod prelude {
    pub use crate::classifier::{ResponseClassifier, StatusCodeClassifier, classifier_fn};
    pub use crate::client::{Client, ClientBuilder, ClientConfig, ConnectionState};
    pub use crate::error::{ClientError, ClientResult, ErrorKind};
    pub use crate::pipeline::{map_request, map_response, request_fn, response_fn};
    pub use crate::types::{RequestConfig, ResponseEnvelope};
    pub use sails_transport_traits::{Headers, ResponseMeta, SocketTransport, Verb};
}
