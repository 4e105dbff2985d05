//! Request interception pipeline.
//!
//! ```text
//! request → authorizers (may deny) → resource handler → monitors → flush
//!                 │                        │                │          │
//!                 └──── headers / cookies / status pass straight to the sink
//!                                          └── body captured ─┴── written in order
//! ```
//!
//! The pieces:
//!
//! - [`InterceptWriter`] / [`CapturedResponse`]: the response handle callbacks
//!   write through, with deferred body bytes
//! - [`Authorizer`], [`ResourceHandler`], [`ResponseMonitor`]: the callback roles
//! - [`Pipeline`]: registration and per-request orchestration

pub mod chain;
pub mod pipeline;
pub mod writer;

use bytes::Bytes;

pub use chain::{
    AuthOutcome, Authorizer, FnAuthorizer, FnHandler, FnMonitor, ResourceHandler,
    ResponseMonitor, authorizer_fn, handler_fn, monitor_fn,
};
pub use pipeline::{Disposition, Pipeline};
pub use writer::{CapturedResponse, InterceptWriter};

/// Incoming request with its body already buffered.
///
/// Callbacks receive it by shared reference; the pipeline never inspects it.
pub type Request = axum::http::Request<Bytes>;
