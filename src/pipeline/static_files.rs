//! Stock pipeline serving static files from a project directory.
//!
//! [`StaticPipeline`] wraps [`tower_http::services::ServeDir`] over the
//! directory named by the `root` pipeline option (default `www`). The
//! intended receiver is an app shell on a client device, but any
//! browser can consume the content. Filesystem faults are reported on
//! the pipeline's error channel and answered with a 500 response.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use super::{Pipeline, PipelineEvent, PipelineEvents};
use crate::config::ServerConfig;

/// Directory served when the `root` pipeline option is unset.
pub const DEFAULT_ROOT: &str = "www";

/// Static file pipeline backed by [`ServeDir`].
#[derive(Debug, Clone)]
pub struct StaticPipeline {
    root: PathBuf,
    inner: ServeDir,
    events: PipelineEvents,
}

impl StaticPipeline {
    /// Builds the pipeline from a resolved configuration.
    ///
    /// Reads the `root` pipeline option; any non-string value falls back
    /// to [`DEFAULT_ROOT`]. Missing directories are not rejected here —
    /// requests against them surface as error events at dispatch time.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let root = config
            .pipeline_option("root")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_ROOT);
        let root = PathBuf::from(root);

        Self {
            inner: ServeDir::new(&root),
            events: PipelineEvents::new(config.event_capacity),
            root,
        }
    }

    /// Factory with the shape the bootstrap expects.
    #[must_use]
    pub fn factory(config: &ServerConfig) -> Arc<dyn Pipeline> {
        Arc::new(Self::from_config(config))
    }

    /// Returns the directory this pipeline serves.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl Pipeline for StaticPipeline {
    async fn handle(&self, request: Request) -> Response {
        match self.inner.clone().try_call(request).await {
            Ok(response) => response.map(Body::new),
            Err(error) => {
                self.events.emit_error(Arc::new(error));
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }
}
