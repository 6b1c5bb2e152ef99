//! # Sails Memory Transport
//!
//! In-process implementation of [`SocketTransport`] for tests, demos and
//! offline development.
//!
//! - **Scripted replies**: a [`Responder`] decides how each invocation is answered
//! - **Silent servers**: replies can be withheld and released later, or dropped
//! - **Server push**: [`MemoryTransport::emit`] delivers events to subscribers
//! - **Recording**: every open, close and invocation is kept for assertions
//!
//! Events and replies are delivered synchronously on the caller's stack, the way
//! a real socket library calls back from inside its own read loop.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sails_transport_memory::{MemoryTransport, Reply};
//! use sails_transport_traits::ResponseMeta;
//!
//! let transport = MemoryTransport::new().with_responder(|request| {
//!     if request.url == "/missing" {
//!         Reply::status(404, None)
//!     } else {
//!         Reply::ok(request.data.clone())
//!     }
//! });
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

mod transport;

pub use transport::{Invocation, MemoryTransport, Reply, Responder};

// Re-export transport traits for convenience
pub use sails_transport_traits::{
    ConnectionHandle, ResponseMeta, SocketOptions, SocketTransport, TransportError,
    TransportRequest, TransportResult, Verb,
};
