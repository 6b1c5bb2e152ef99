//! # Sails Transport Traits
//!
//! The contract between the Sails client and the socket transport underneath it.
//! Transport implementations depend on this crate; the client depends on nothing else
//! from them.
//!
//! ## Overview
//!
//! This crate defines:
//! - **Traits**: [`SocketTransport`]
//! - **Types**: [`ConnectionHandle`], [`Verb`], [`TransportRequest`], [`ResponseMeta`]
//! - **Callbacks**: [`ReplyCallback`], [`EventCallback`]
//! - **Errors**: [`TransportError`], [`TransportResult`]
//! - **Config**: [`SocketOptions`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sails_transport_traits::{ConnectionHandle, SocketOptions, SocketTransport, TransportResult};
//!
//! #[derive(Debug)]
//! struct MyTransport { /* ... */ }
//!
//! impl SocketTransport for MyTransport {
//!     fn open(&self, address: &str, options: &SocketOptions) -> /* ... */
//!     // ... other trait methods
//! }
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
    clippy::must_use_candidate
)]

mod config;
mod error;
mod traits;
mod types;

pub use config::SocketOptions;
pub use error::{TransportError, TransportResult};
pub use traits::{BoxFuture, EventCallback, ReplyCallback, SocketTransport};
pub use types::{ConnectionHandle, Headers, ResponseMeta, TransportRequest, Verb};
