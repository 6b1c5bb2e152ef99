//! Response classification
//!
//! The classifier is the first thing that sees a transport reply. It decides
//! whether the `(payload, meta)` pair resolves the call or rejects it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use sails_transport_traits::ResponseMeta;

use crate::error::{ClientError, ClientResult};
use crate::types::ResponseEnvelope;

/// Decides whether a transport reply is a success or a failure.
///
/// Return `Ok` to resolve the call with that envelope (response transforms run
/// next), or `Err` to reject it. Rejections are usually
/// [`ClientError::classified`], but any [`ClientError`] is passed through as is.
#[async_trait]
pub trait ResponseClassifier: Send + Sync + fmt::Debug {
    /// Classify one reply.
    async fn classify(
        &self,
        data: Option<Value>,
        meta: Option<ResponseMeta>,
    ) -> ClientResult<ResponseEnvelope>;
}

/// Default policy: reject when a status code is present whose hundreds digit
/// is not `2`, resolve otherwise.
///
/// | status       | outcome  |
/// |--------------|----------|
/// | none or `0`  | resolve  |
/// | `200..=299`  | resolve  |
/// | anything else| reject   |
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCodeClassifier;

#[async_trait]
impl ResponseClassifier for StatusCodeClassifier {
    async fn classify(
        &self,
        data: Option<Value>,
        meta: Option<ResponseMeta>,
    ) -> ClientResult<ResponseEnvelope> {
        let envelope = ResponseEnvelope::new(data, meta);
        if envelope.is_success() {
            Ok(envelope)
        } else {
            Err(ClientError::classified(envelope))
        }
    }
}

/// Classifier backed by an async closure. See [`classifier_fn`].
pub struct FnClassifier<F> {
    f: F,
}

impl<F> fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnClassifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> ResponseClassifier for FnClassifier<F>
where
    F: Fn(Option<Value>, Option<ResponseMeta>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ClientResult<ResponseEnvelope>> + Send + 'static,
{
    async fn classify(
        &self,
        data: Option<Value>,
        meta: Option<ResponseMeta>,
    ) -> ClientResult<ResponseEnvelope> {
        (self.f)(data, meta).await
    }
}

/// Build a classifier from an async closure.
///
/// ```rust
/// use sails_client::{ClientError, ResponseEnvelope, classifier_fn};
///
/// // Treat an `error` field in the payload as a failure, whatever the status.
/// let classifier = classifier_fn(|data, meta| async move {
///     let envelope = ResponseEnvelope::new(data, meta);
///     let failed = envelope
///         .data
///         .as_ref()
///         .is_some_and(|data| data.get("error").is_some());
///     if failed {
///         Err(ClientError::classified(envelope))
///     } else {
///         Ok(envelope)
///     }
/// });
/// ```
pub fn classifier_fn<F, Fut>(f: F) -> Arc<dyn ResponseClassifier>
where
    F: Fn(Option<Value>, Option<ResponseMeta>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ClientResult<ResponseEnvelope>> + Send + 'static,
{
    Arc::new(FnClassifier { f })
}
