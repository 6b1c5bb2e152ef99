//! Client builder
//!
//! The builder is the only place transforms, the classifier and the scheduler
//! can be chosen. Once `build` returns, the pipeline is frozen behind an `Arc`.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info};

use sails_transport_traits::{SocketOptions, SocketTransport, TransportError};

use super::config::ClientConfig;
use super::connection::ConnectionManager;
use super::core::{Client, ClientInner};
use crate::classifier::{ResponseClassifier, StatusCodeClassifier};
use crate::error::{ClientError, ClientResult};
use crate::pipeline::{RequestTransform, ResponseTransform, TransformPipeline};
use crate::scheduler::{Scheduler, TokioScheduler};

/// Builder for configuring and creating clients.
///
/// # Examples
///
/// ```rust,no_run
/// use sails_client::ClientBuilder;
/// use sails_client::pipeline::map_request;
/// use sails_transport_memory::MemoryTransport;
///
/// # async fn example() -> sails_client::ClientResult<()> {
/// let client = ClientBuilder::new()
///     .with_address("api.example.com:443")
///     .with_request_timeout(5_000)
///     .with_request_transform(map_request("trace", |mut config| {
///         config.insert_data("traceId", serde_json::json!("abc"));
///         config
///     }))
///     .with_auto_connect(true)
///     .build(MemoryTransport::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    pipeline: TransformPipeline,
    classifier: Option<Arc<dyn ResponseClassifier>>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl ClientBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the address handed to the transport on connect.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the options handed to the transport on connect.
    pub fn with_options(mut self, options: SocketOptions) -> Self {
        self.config.options = options;
        self
    }

    /// Connect as part of [`build`](Self::build).
    pub fn with_auto_connect(mut self, enabled: bool) -> Self {
        self.config.auto_connect = enabled;
        self
    }

    /// Fail calls that get no reply within `timeout_ms` milliseconds.
    pub fn with_request_timeout(mut self, timeout_ms: u64) -> Self {
        self.config.request_timeout_ms = Some(timeout_ms);
        self
    }

    /// Append a request transform. Transforms run in the order they are added.
    pub fn with_request_transform(mut self, stage: Arc<dyn RequestTransform>) -> Self {
        self.pipeline.add_request_transform(stage);
        self
    }

    /// Append a response transform. Transforms run in the order they are added.
    pub fn with_response_transform(mut self, stage: Arc<dyn ResponseTransform>) -> Self {
        self.pipeline.add_response_transform(stage);
        self
    }

    /// Replace the whole pipeline.
    pub fn with_pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Replace the default [`StatusCodeClassifier`].
    pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Replace the default [`TokioScheduler`].
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Build the client over `transport`.
    ///
    /// Must be called from within a Tokio runtime; that runtime runs the
    /// default scheduler. With `auto_connect` set, the
    /// connection is opened before this returns and a failure to connect is
    /// returned as the build error.
    pub async fn build<T: SocketTransport + 'static>(self, transport: T) -> ClientResult<Client<T>> {
        let runtime = Handle::try_current().map_err(|e| {
            ClientError::Transport(TransportError::ConfigurationError(format!(
                "client must be built inside a Tokio runtime: {e}"
            )))
        })?;

        let classifier: Arc<dyn ResponseClassifier> = match self.classifier {
            Some(classifier) => classifier,
            None => Arc::new(StatusCodeClassifier),
        };
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::new(runtime)),
        };

        debug!(
            transport = transport.name(),
            address = %self.config.address,
            request_transforms = ?self.pipeline.request_stage_names(),
            response_transforms = ?self.pipeline.response_stage_names(),
            request_timeout_ms = ?self.config.request_timeout_ms,
            "Building client"
        );

        let connection = ConnectionManager::new(
            Arc::new(transport),
            self.config.address.clone(),
            self.config.options.clone(),
        );
        let auto_connect = self.config.auto_connect;

        let client = Client {
            inner: Arc::new(ClientInner {
                config: self.config,
                connection,
                pipeline: Arc::new(self.pipeline),
                classifier,
                scheduler,
            }),
        };

        if auto_connect {
            info!(address = %client.config().address, "Auto-connecting");
            client.connect().await?;
        }

        Ok(client)
    }
}
