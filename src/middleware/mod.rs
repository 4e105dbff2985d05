//! Ready-made pipeline callbacks.
//!
//! Authorizers run before a resource handler and can reject the request.
//! Monitors run after it and only observe.

/// Cookie authorizers
pub mod auth;
/// Logging monitors
pub mod logging;
