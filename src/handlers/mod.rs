//! Demonstration resources.
//!
//! `login` and `resource` are pipeline resource handlers: they write through
//! an [`InterceptWriter`](crate::intercept::InterceptWriter) and never see
//! authorization logic. `health` is a plain axum handler mounted outside any
//! pipeline.

/// Liveness endpoint
pub mod health;
/// Session-issuing login page
pub mod login;
/// Protected resource update
pub mod resource;
