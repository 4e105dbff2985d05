//! Buffered response capture.
//!
//! [`InterceptWriter`] is what authorizers, the resource handler and monitors
//! write through. Headers, cookies and status pass straight to the real sink;
//! body writes are deferred into a [`CapturedResponse`] that the pipeline
//! flushes once the handler and all monitors have run.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum_extra::extract::cookie::Cookie;
use bytes::{Bytes, BytesMut};

use crate::sink::ResponseSink;

/// Body chunks written by the resource handler, in call order.
#[derive(Debug, Clone, Default)]
pub struct CapturedResponse {
    chunks: Vec<Bytes>,
}

impl CapturedResponse {
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sum of all chunk lengths.
    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// All chunks concatenated.
    pub fn to_bytes(&self) -> Bytes {
        let mut body = BytesMut::with_capacity(self.total_bytes());
        for chunk in &self.chunks {
            body.extend_from_slice(chunk);
        }
        body.freeze()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bytes> {
        self.chunks.iter()
    }

    fn push(&mut self, chunk: Bytes) {
        self.chunks.push(chunk);
    }
}

impl<'a> IntoIterator for &'a CapturedResponse {
    type Item = &'a Bytes;
    type IntoIter = std::slice::Iter<'a, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Response handle given to every pipeline callback.
///
/// Bound to one request's sink; a new writer with an empty capture is created
/// for each request.
pub struct InterceptWriter<'a> {
    sink: &'a mut dyn ResponseSink,
    captured: CapturedResponse,
}

impl<'a> InterceptWriter<'a> {
    pub(crate) fn new(sink: &'a mut dyn ResponseSink) -> Self {
        Self {
            sink,
            captured: CapturedResponse::default(),
        }
    }

    /// Headers of the real sink.
    pub fn headers(&self) -> &HeaderMap {
        self.sink.headers()
    }

    /// Mutable headers of the real sink. Changes are visible on the sink
    /// immediately.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    /// Set the status line on the real sink. This commits the response head.
    pub fn set_status(&mut self, status: StatusCode) {
        self.sink.set_status(status);
    }

    /// Capture `buf` as one body chunk.
    ///
    /// Nothing reaches the sink until the pipeline flushes, so this never
    /// fails and always reports the full length.
    pub fn write(&mut self, buf: impl AsRef<[u8]>) -> usize {
        let buf = buf.as_ref();
        if buf.is_empty() {
            return 0;
        }
        self.captured.push(Bytes::copy_from_slice(buf));
        buf.len()
    }

    /// Append a `Set-Cookie` header to the real sink.
    ///
    /// Cookies that do not form a valid header value are dropped.
    pub fn set_cookie(&mut self, cookie: &Cookie<'_>) {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                self.sink.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => {
                tracing::warn!(cookie = cookie.name(), error = %err, "dropping invalid cookie");
            }
        }
    }

    /// Append a header value, keeping existing values of the same name.
    pub fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.sink.headers_mut().append(name, value);
    }

    /// Body chunks captured so far.
    pub fn captured(&self) -> &CapturedResponse {
        &self.captured
    }

    pub(crate) fn take_captured(&mut self) -> CapturedResponse {
        std::mem::take(&mut self.captured)
    }

    pub(crate) fn sink(&mut self) -> &mut dyn ResponseSink {
        &mut *self.sink
    }
}
