//! axum adapter: serves a [`Pipeline`] as a route.
//!
//! An [`Endpoint`] is a `tower::Service`, so it mounts with
//! `Router::route_service`:
//!
//! ```ignore
//! let login = Endpoint::new(Pipeline::new(LoginPage::new("S")), EndpointConfig::default());
//! let app = Router::new().route_service("/login", login);
//! ```
//!
//! # Flow
//!
//! 1. Buffer the request body (bounded by `max_body_bytes`)
//! 2. Spawn the pipeline on its own task, writing into a [`StreamingSink`]
//! 3. Wait for the response head to be committed
//! 4. Return the head with a body that streams the flushed chunks
//!
//! The pipeline task keeps running while the body streams. If the client
//! goes away, the next flush write fails and the task stops.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request as HttpRequest;
use axum::response::{IntoResponse, Response};
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::error::AppError;
use crate::intercept::{Pipeline, Request};
use crate::sink::StreamingSink;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pipeline mounted on the HTTP transport.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pipeline: Arc<Pipeline>,
    config: EndpointConfig,
}

impl Endpoint {
    pub fn new(pipeline: Pipeline, config: EndpointConfig) -> Self {
        Self::shared(Arc::new(pipeline), config)
    }

    /// Mount a pipeline that is already shared, e.g. across several routes.
    pub fn shared(pipeline: Arc<Pipeline>, config: EndpointConfig) -> Self {
        Self { pipeline, config }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run one HTTP request through the pipeline.
    pub async fn dispatch(&self, request: HttpRequest) -> Response {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "intercept",
            %request_id,
            method = %request.method(),
            uri = %request.uri(),
        );

        let (parts, body) = request.into_parts();
        let body = match axum::body::to_bytes(body, self.config.max_body_bytes).await {
            Ok(body) => body,
            Err(err) => {
                let err = AppError::from_body_error(err);
                span.in_scope(|| tracing::warn!(error = %err, "rejecting request body"));
                return err.into_response();
            }
        };
        let request = Request::from_parts(parts, body);

        let (mut sink, pending) = StreamingSink::channel(self.config.flush_buffer);
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(
            async move {
                pipeline.handle(&mut sink, &request).await;
            }
            .instrument(span.clone()),
        );

        match pending.resolve().await {
            Ok(response) => response,
            Err(_) => {
                span.in_scope(|| tracing::error!("pipeline task ended without a response"));
                AppError::PipelineAborted.into_response()
            }
        }
    }
}

impl Service<HttpRequest> for Endpoint {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let endpoint = self.clone();
        Box::pin(async move { Ok(endpoint.dispatch(request).await) })
    }
}
