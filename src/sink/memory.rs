//! In-process recording sink.
//!
//! Useful for driving a [`Pipeline`](crate::intercept::Pipeline) without a
//! network transport, e.g. in tests or when embedding the pipeline behind a
//! non-HTTP front end.

use async_trait::async_trait;
use axum::http::{HeaderMap, Response, StatusCode};
use bytes::{Bytes, BytesMut};

use super::ResponseSink;
use crate::error::SinkError;

/// Sink that records the committed head and body in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    headers: HeaderMap,
    committed: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
    writes: usize,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write after `writes` successful ones, as a disconnected
    /// client would.
    #[must_use]
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Committed status, or `None` if the head has not been committed.
    pub fn status(&self) -> Option<StatusCode> {
        self.committed.as_ref().map(|(status, _)| *status)
    }

    /// Headers as committed to the client. Before commit this is the live map.
    pub fn committed_headers(&self) -> &HeaderMap {
        match &self.committed {
            Some((_, headers)) => headers,
            None => &self.headers,
        }
    }

    /// Body bytes received so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of successful body writes.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Build the response the client would have seen.
    ///
    /// An uncommitted sink yields status 200 with the live headers, matching
    /// what a transport does when a handler returns without writing anything.
    pub fn into_response(mut self) -> Response<Bytes> {
        self.commit(StatusCode::OK);
        let (status, headers) = self.committed.unwrap_or_default();

        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    fn commit(&mut self, status: StatusCode) {
        if self.committed.is_none() {
            self.committed = Some((status, self.headers.clone()));
        }
    }
}

#[async_trait]
impl ResponseSink for MemorySink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        if let Some((committed, _)) = &self.committed {
            tracing::warn!(%committed, ignored = %status, "superfluous status write");
            return;
        }
        self.commit(status);
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        if self.fail_after.is_some_and(|limit| self.writes >= limit) {
            return Err(SinkError::Io(std::io::ErrorKind::BrokenPipe.into()));
        }

        self.commit(StatusCode::OK);
        self.body.extend_from_slice(&chunk);
        self.writes += 1;
        Ok(())
    }
}
