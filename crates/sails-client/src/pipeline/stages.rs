//! Transform stage traits and closure adapters
//!
//! A stage takes its value by value and returns the value for the next stage,
//! so a stage can modify in place or build a new one. Returning `Err` aborts
//! the call.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::types::{RequestConfig, ResponseEnvelope};

/// A stage applied to every outgoing [`RequestConfig`], in registration order.
#[async_trait]
pub trait RequestTransform: Send + Sync + fmt::Debug {
    /// Stage name, used in logs and in [`ClientError::Transform`](crate::ClientError::Transform).
    fn name(&self) -> &str;

    /// Transform the request.
    async fn transform(&self, config: RequestConfig) -> Result<RequestConfig, BoxError>;
}

/// A stage applied to every successful [`ResponseEnvelope`], in registration order.
#[async_trait]
pub trait ResponseTransform: Send + Sync + fmt::Debug {
    /// Stage name, used in logs and in [`ClientError::Transform`](crate::ClientError::Transform).
    fn name(&self) -> &str;

    /// Transform the response.
    async fn transform(&self, response: ResponseEnvelope) -> Result<ResponseEnvelope, BoxError>;
}

/// Request stage backed by an async closure. See [`request_fn`].
pub struct FnRequestTransform<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnRequestTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRequestTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> RequestTransform for FnRequestTransform<F>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestConfig, BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn transform(&self, config: RequestConfig) -> Result<RequestConfig, BoxError> {
        (self.f)(config).await
    }
}

/// Response stage backed by an async closure. See [`response_fn`].
pub struct FnResponseTransform<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnResponseTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResponseTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> ResponseTransform for FnResponseTransform<F>
where
    F: Fn(ResponseEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResponseEnvelope, BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn transform(&self, response: ResponseEnvelope) -> Result<ResponseEnvelope, BoxError> {
        (self.f)(response).await
    }
}

/// Build a request stage from an async, fallible closure.
///
/// ```rust
/// use sails_client::pipeline::request_fn;
///
/// let stage = request_fn("csrf", |mut config| async move {
///     config.insert_data("_csrf", serde_json::json!("token"));
///     Ok(config)
/// });
/// ```
pub fn request_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn RequestTransform>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestConfig, BoxError>> + Send + 'static,
{
    Arc::new(FnRequestTransform {
        name: name.into(),
        f,
    })
}

/// Build a response stage from an async, fallible closure.
pub fn response_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn ResponseTransform>
where
    F: Fn(ResponseEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResponseEnvelope, BoxError>> + Send + 'static,
{
    Arc::new(FnResponseTransform {
        name: name.into(),
        f,
    })
}

/// Build a request stage from a synchronous, infallible closure.
pub fn map_request<F>(name: impl Into<String>, f: F) -> Arc<dyn RequestTransform>
where
    F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
{
    request_fn(name, move |config| std::future::ready(Ok(f(config))))
}

/// Build a response stage from a synchronous, infallible closure.
pub fn map_response<F>(name: impl Into<String>, f: F) -> Arc<dyn ResponseTransform>
where
    F: Fn(ResponseEnvelope) -> ResponseEnvelope + Send + Sync + 'static,
{
    response_fn(name, move |response| std::future::ready(Ok(f(response))))
}
