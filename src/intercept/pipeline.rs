//! Pipeline registration and per-request orchestration.
//!
//! A [`Pipeline`] owns exactly one resource handler plus ordered chains of
//! authorizers and monitors. [`Pipeline::handle`] runs one request through
//! it:
//!
//! 1. Bind the sink and start with an empty capture
//! 2. Run authorizers in registration order; stop at the first denial and
//!    answer with it
//! 3. Invoke the resource handler
//! 4. Run every monitor in registration order
//! 5. Flush the captured chunks to the sink, in order, stopping at the first
//!    failed write
//!
//! # Sharing
//!
//! Registration takes `&mut self` or `self`, so chains can only grow while
//! the pipeline is exclusively owned. Put it behind an `Arc` once setup is
//! done; from then on every request reads the same chains and gets its own
//! [`CapturedResponse`].
//!
//! # Known sharp edge
//!
//! Headers, cookies and status are written to the sink immediately while the
//! body is deferred. A header an authorizer sets before a later authorizer
//! denies is still sent with the denial response.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode, header};
use bytes::Bytes;

use super::Request;
use super::chain::{AuthOutcome, Authorizer, ResourceHandler, ResponseMonitor};
use super::writer::{CapturedResponse, InterceptWriter};
use crate::error::{Denial, SinkError};
use crate::sink::ResponseSink;

/// Interception pipeline around one resource handler.
pub struct Pipeline {
    handler: Arc<dyn ResourceHandler>,
    authorizers: Vec<Arc<dyn Authorizer>>,
    monitors: Vec<Arc<dyn ResponseMonitor>>,
}

/// How a request left the pipeline.
#[derive(Debug)]
pub enum Disposition {
    /// An authorizer denied the request; the handler and monitors did not run.
    Denied { status: StatusCode },

    /// Every captured chunk reached the sink.
    Delivered { chunks: usize, bytes: usize },

    /// The sink failed mid-flush. The client may have received a prefix of
    /// the body.
    Truncated {
        chunks_written: usize,
        bytes_written: usize,
        error: SinkError,
    },
}

impl Disposition {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Disposition::Delivered { .. })
    }
}

impl Pipeline {
    /// Create a pipeline with no authorizers and no monitors.
    pub fn new(handler: impl ResourceHandler + 'static) -> Self {
        Self::from_parts(Arc::new(handler), Vec::new(), Vec::new())
    }

    /// Create a pipeline with initial chains.
    pub fn from_parts(
        handler: Arc<dyn ResourceHandler>,
        authorizers: Vec<Arc<dyn Authorizer>>,
        monitors: Vec<Arc<dyn ResponseMonitor>>,
    ) -> Self {
        Self {
            handler,
            authorizers,
            monitors,
        }
    }

    /// Append an authorizer.
    #[must_use]
    pub fn authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.add_authorizer(authorizer);
        self
    }

    /// Append a response monitor.
    #[must_use]
    pub fn monitor(mut self, monitor: impl ResponseMonitor + 'static) -> Self {
        self.add_monitor(monitor);
        self
    }

    /// Append an authorizer in place.
    pub fn add_authorizer(&mut self, authorizer: impl Authorizer + 'static) -> &mut Self {
        self.authorizers.push(Arc::new(authorizer));
        self
    }

    /// Append a response monitor in place.
    pub fn add_monitor(&mut self, monitor: impl ResponseMonitor + 'static) -> &mut Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    /// Authorizer names in execution order.
    pub fn authorizer_names(&self) -> Vec<&'static str> {
        self.authorizers.iter().map(|a| a.name()).collect()
    }

    /// Monitor names in execution order.
    pub fn monitor_names(&self) -> Vec<&'static str> {
        self.monitors.iter().map(|m| m.name()).collect()
    }

    /// Run one request through the pipeline, writing the response to `sink`.
    pub async fn handle(&self, sink: &mut dyn ResponseSink, request: &Request) -> Disposition {
        let mut writer = InterceptWriter::new(sink);

        if let Some(denial) = self.authorize(&mut writer, request).await {
            let status = denial.status();
            write_denial(writer.sink(), &denial).await;
            return Disposition::Denied { status };
        }

        self.handler.call(&mut writer, request).await;

        let captured = writer.take_captured();
        for monitor in &self.monitors {
            monitor.observe(&mut writer, request, &captured).await;

            let stray = writer.take_captured();
            if !stray.is_empty() {
                tracing::warn!(
                    monitor = monitor.name(),
                    bytes = stray.total_bytes(),
                    "discarding body bytes written by response monitor"
                );
            }
        }

        let disposition = flush(writer.sink(), &captured).await;
        tracing::debug!(?disposition, "request complete");
        disposition
    }

    async fn authorize(
        &self,
        writer: &mut InterceptWriter<'_>,
        request: &Request,
    ) -> Option<Denial> {
        for authorizer in &self.authorizers {
            if let AuthOutcome::Deny(denial) = authorizer.authorize(writer, request).await {
                tracing::warn!(
                    authorizer = authorizer.name(),
                    status = %denial.status(),
                    error = %denial.cause(),
                    "authorizer denied request"
                );
                return Some(denial);
            }
        }
        None
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("authorizers", &self.authorizer_names())
            .field("monitors", &self.monitor_names())
            .finish_non_exhaustive()
    }
}

/// Plain-text error response: the message is the whole body.
async fn write_denial(sink: &mut dyn ResponseSink, denial: &Denial) {
    let headers = sink.headers_mut();
    headers.remove(header::CONTENT_LENGTH);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    sink.set_status(denial.status());

    let body = Bytes::from(denial.message().into_owned());
    if let Err(err) = sink.write(body).await {
        tracing::error!(error = %err, "failed to send denial response");
    }
}

async fn flush(sink: &mut dyn ResponseSink, captured: &CapturedResponse) -> Disposition {
    let mut bytes_written = 0;

    for (index, chunk) in captured.iter().enumerate() {
        if let Err(error) = sink.write(chunk.clone()).await {
            tracing::error!(
                chunks_written = index,
                bytes_written,
                error = %error,
                "flush to client failed"
            );
            return Disposition::Truncated {
                chunks_written: index,
                bytes_written,
                error,
            };
        }
        bytes_written += chunk.len();
    }

    Disposition::Delivered {
        chunks: captured.len(),
        bytes: bytes_written,
    }
}
