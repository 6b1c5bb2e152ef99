//! Request/response transform pipeline
//!
//! Every verb call threads its value through the pipeline in a fixed order:
//!
//! ```text
//! RequestConfig → Stage 1 → Stage 2 → Stage N → Transport
//!                                                   ↓
//!                                              Classifier
//!                                                   ↓
//! Caller ← Stage N ← Stage 2 ← Stage 1 ← ResponseEnvelope (success only)
//! ```
//!
//! Both sequences run front to back in registration order. A failing stage
//! aborts the rest of that call; nothing is retried or skipped.
//!
//! The pipeline is assembled before the client is built and then shared
//! read-only behind an `Arc`, so the order is fixed for the client's lifetime.

mod stages;

pub use stages::{
    FnRequestTransform, FnResponseTransform, RequestTransform, ResponseTransform, map_request,
    map_response, request_fn, response_fn,
};

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{ClientError, ClientResult};
use crate::types::{RequestConfig, ResponseEnvelope};

/// Ordered request and response transform stages.
///
/// # Examples
///
/// ```rust
/// use sails_client::pipeline::{TransformPipeline, map_request};
///
/// let mut pipeline = TransformPipeline::new();
/// pipeline.add_request_transform(map_request("trace", |mut config| {
///     config.insert_data("traceId", serde_json::json!("abc"));
///     config
/// }));
/// assert_eq!(pipeline.request_stage_names(), vec!["trace"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    /// Request stages in execution order
    request_stages: Vec<Arc<dyn RequestTransform>>,

    /// Response stages in execution order
    response_stages: Vec<Arc<dyn ResponseTransform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request stage. Stages run in the order they are added.
    pub fn add_request_transform(&mut self, stage: Arc<dyn RequestTransform>) {
        debug!("Adding request transform: {}", stage.name());
        self.request_stages.push(stage);
    }

    /// Append a response stage. Stages run in the order they are added.
    pub fn add_response_transform(&mut self, stage: Arc<dyn ResponseTransform>) {
        debug!("Adding response transform: {}", stage.name());
        self.response_stages.push(stage);
    }

    /// Names of the request stages, in execution order.
    pub fn request_stage_names(&self) -> Vec<&str> {
        self.request_stages.iter().map(|stage| stage.name()).collect()
    }

    /// Names of the response stages, in execution order.
    pub fn response_stage_names(&self) -> Vec<&str> {
        self.response_stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns `true` if no stage of either kind is registered.
    pub fn is_empty(&self) -> bool {
        self.request_stages.is_empty() && self.response_stages.is_empty()
    }

    /// Thread `config` through every request stage.
    ///
    /// Each stage receives the previous stage's output. The first failure is
    /// returned as [`ClientError::Transform`] and the remaining stages are skipped.
    pub async fn run_request_stages(&self, mut config: RequestConfig) -> ClientResult<RequestConfig> {
        debug!(
            "Running {} request transforms for {} {}",
            self.request_stages.len(),
            config.method,
            config.url
        );

        for (index, stage) in self.request_stages.iter().enumerate() {
            debug!(
                "Request transform {} of {}: {}",
                index + 1,
                self.request_stages.len(),
                stage.name()
            );

            let method = config.method.clone();
            config = stage.transform(config).await.map_err(|source| {
                error!(
                    "Request transform '{}' failed for '{}': {}",
                    stage.name(),
                    method,
                    source
                );
                ClientError::transform(stage.name(), source)
            })?;
        }

        Ok(config)
    }

    /// Thread a successful `response` through every response stage.
    ///
    /// Same discipline as [`run_request_stages`](Self::run_request_stages).
    pub async fn run_response_stages(
        &self,
        mut response: ResponseEnvelope,
    ) -> ClientResult<ResponseEnvelope> {
        debug!(
            "Running {} response transforms",
            self.response_stages.len()
        );

        for (index, stage) in self.response_stages.iter().enumerate() {
            debug!(
                "Response transform {} of {}: {}",
                index + 1,
                self.response_stages.len(),
                stage.name()
            );

            response = stage.transform(response).await.map_err(|source| {
                error!("Response transform '{}' failed: {}", stage.name(), source);
                ClientError::transform(stage.name(), source)
            })?;
        }

        Ok(response)
    }
}
