//! Client implementation
//!
//! - `core`: the cloneable `Client<T>` and its lifecycle calls
//! - `connection`: connection state, per-cycle readiness and queued subscriptions
//! - `config`: `ClientConfig` and file loading
//! - `builder`: `ClientBuilder`
//! - `operations`: verb calls and event subscriptions

pub mod builder;
pub mod config;
pub mod connection;
pub mod core;
pub mod operations;

pub use builder::ClientBuilder;
pub use config::ClientConfig;
pub use connection::{
    ConnectionManager, ConnectionState, ReadySignal, RegistrationReceiver, SubscriptionKind,
};
pub use self::core::Client;
pub use operations::events::Subscription;
