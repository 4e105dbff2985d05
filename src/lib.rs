//! Intercepting request handler
//!
//! Wraps a resource handler in a pipeline that runs authorizers before it and
//! response monitors after it, without the handler implementing any of that
//! logic itself.
//!
//! # Architecture
//!
//! - **Core**: [`intercept`] (capture writer, callback traits, orchestrator)
//! - **Transport seam**: [`sink`] (real response sinks) and [`endpoint`]
//!   (axum/tower service)
//! - **Ready-made callbacks**: [`middleware`] (authorizers, monitors) and
//!   [`handlers`] (demonstration resources)
//!
//! # Request Flow
//!
//! 1. Authorizers run in registration order; the first denial answers the request
//! 2. The resource handler writes its body into a capture buffer
//! 3. Monitors observe the captured body
//! 4. Captured chunks are flushed to the client in order

pub mod config;
pub mod endpoint;
pub mod error;
pub mod handlers;
pub mod intercept;
pub mod middleware;
pub mod sink;

pub use endpoint::Endpoint;
pub use error::{AppError, Denial, SinkError};
pub use intercept::{
    AuthOutcome, Authorizer, CapturedResponse, Disposition, InterceptWriter, Pipeline, Request,
    ResourceHandler, ResponseMonitor,
};
pub use sink::{MemorySink, ResponseSink, StreamingSink};
