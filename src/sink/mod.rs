//! The real response sink the pipeline writes to.
//!
//! A sink is the transport's response-writing primitive: it owns the header
//! map, accepts a status line, and takes raw body bytes. The pipeline never
//! buffers headers or status; those go straight to the sink. Only body bytes
//! are captured and later flushed through [`ResponseSink::write`].
//!
//! # Commit semantics
//!
//! The response head (status and headers) is committed either by the first
//! explicit [`ResponseSink::set_status`] call or implicitly by the first body
//! write, which commits status 200. After that:
//!
//! - further `set_status` calls are ignored (and logged as superfluous)
//! - header mutations are no longer transmitted to the client

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

use crate::error::SinkError;

pub mod memory;
pub mod streaming;

pub use memory::MemorySink;
pub use streaming::{PendingResponse, StreamingSink};

/// Response-writing primitive provided by the host transport.
///
/// A sink is request-scoped and owned by the task processing that request.
#[async_trait]
pub trait ResponseSink: Send {
    /// Current header collection.
    fn headers(&self) -> &HeaderMap;

    /// Mutable header collection. Changes made after the head is committed
    /// are not sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Set the status line. Commits the response head.
    fn set_status(&mut self, status: StatusCode);

    /// Write one chunk of body bytes, committing the head first if needed.
    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError>;
}
