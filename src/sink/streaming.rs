//! Channel-backed sink that streams a response to axum.
//!
//! The head is sent over a oneshot channel the moment it is committed, so the
//! transport can start the response while body chunks are still being
//! flushed through a bounded mpsc channel.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use super::ResponseSink;
use crate::error::SinkError;

type Head = (StatusCode, HeaderMap);

/// Sink half of a streamed response.
pub struct StreamingSink {
    headers: HeaderMap,
    committed: Option<StatusCode>,
    head_tx: Option<oneshot::Sender<Head>>,
    body_tx: mpsc::Sender<Result<Bytes, Infallible>>,
}

/// Receiving half: resolves into an axum response once the head is committed.
pub struct PendingResponse {
    head_rx: oneshot::Receiver<Head>,
    body_rx: mpsc::Receiver<Result<Bytes, Infallible>>,
}

impl StreamingSink {
    /// Create a connected sink/response pair. `buffer` bounds the number of
    /// chunks in flight before `write` waits for the client to catch up.
    pub fn channel(buffer: usize) -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(buffer.max(1));

        let sink = Self {
            headers: HeaderMap::new(),
            committed: None,
            head_tx: Some(head_tx),
            body_tx,
        };

        (sink, PendingResponse { head_rx, body_rx })
    }

    fn commit(&mut self, status: StatusCode) {
        if let Some(head_tx) = self.head_tx.take() {
            self.committed = Some(status);
            // Receiver gone means the request future was dropped; nothing to tell.
            let _ = head_tx.send((status, self.headers.clone()));
        }
    }
}

#[async_trait]
impl ResponseSink for StreamingSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        if let Some(committed) = self.committed {
            tracing::warn!(%committed, ignored = %status, "superfluous status write");
            return;
        }
        self.commit(status);
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.commit(StatusCode::OK);
        self.body_tx
            .send(Ok(chunk))
            .await
            .map_err(|_| SinkError::Disconnected)
    }
}

impl Drop for StreamingSink {
    fn drop(&mut self) {
        // A panicking callback must not turn into an empty 200.
        if !std::thread::panicking() {
            self.commit(StatusCode::OK);
        }
    }
}

impl PendingResponse {
    /// Wait for the head and build a response streaming the body.
    ///
    /// Fails if the sink was dropped without committing, which only happens
    /// when the task driving it panicked.
    pub async fn resolve(self) -> Result<Response, oneshot::error::RecvError> {
        let (status, headers) = self.head_rx.await?;

        let body = Body::from_stream(ReceiverStream::new(self.body_rx));
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
