//! Callback contracts for the three pipeline roles.
//!
//! - [`Authorizer`]: runs before the handler and may deny the request.
//! - [`ResourceHandler`]: produces the response through an [`InterceptWriter`].
//! - [`ResponseMonitor`]: observes the captured body after the handler.
//!
//! Each trait can be implemented directly (async) or built from a plain
//! closure with [`authorizer_fn`], [`handler_fn`] and [`monitor_fn`].

use async_trait::async_trait;

use super::Request;
use super::writer::{CapturedResponse, InterceptWriter};
use crate::error::Denial;

/// Result of one authorizer.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Continue with the next authorizer (or the handler).
    Allow,
    /// Stop the pipeline and answer with the denial.
    Deny(Denial),
}

impl AuthOutcome {
    pub fn is_allow(&self) -> bool {
        matches!(self, AuthOutcome::Allow)
    }
}

impl From<Denial> for AuthOutcome {
    fn from(denial: Denial) -> Self {
        AuthOutcome::Deny(denial)
    }
}

impl From<Result<(), Denial>> for AuthOutcome {
    fn from(result: Result<(), Denial>) -> Self {
        match result {
            Ok(()) => AuthOutcome::Allow,
            Err(denial) => AuthOutcome::Deny(denial),
        }
    }
}

/// Pre-handler check.
///
/// Authorizers may set cookies or headers through the writer even when they
/// allow (e.g. refreshing a session cookie).
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Name used in log fields.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn authorize(&self, writer: &mut InterceptWriter<'_>, request: &Request) -> AuthOutcome;
}

/// The resource a pipeline protects.
///
/// Errors are the handler's own business: it signals them through the status
/// code and body it writes.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn call(&self, writer: &mut InterceptWriter<'_>, request: &Request);
}

/// Post-handler observer (logging, metrics, auditing).
///
/// Monitors cannot stop delivery. Body bytes they write are discarded.
#[async_trait]
pub trait ResponseMonitor: Send + Sync {
    /// Name used in log fields.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn observe(
        &self,
        writer: &mut InterceptWriter<'_>,
        request: &Request,
        captured: &CapturedResponse,
    );
}

/// Authorizer built from a closure. See [`authorizer_fn`].
#[derive(Clone)]
pub struct FnAuthorizer<F> {
    name: &'static str,
    func: F,
}

/// Wrap a synchronous closure as an [`Authorizer`].
pub fn authorizer_fn<F>(name: &'static str, func: F) -> FnAuthorizer<F>
where
    F: Fn(&mut InterceptWriter<'_>, &Request) -> AuthOutcome + Send + Sync,
{
    FnAuthorizer { name, func }
}

#[async_trait]
impl<F> Authorizer for FnAuthorizer<F>
where
    F: Fn(&mut InterceptWriter<'_>, &Request) -> AuthOutcome + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn authorize(&self, writer: &mut InterceptWriter<'_>, request: &Request) -> AuthOutcome {
        (self.func)(writer, request)
    }
}

/// Resource handler built from a closure. See [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler<F> {
    func: F,
}

/// Wrap a synchronous closure as a [`ResourceHandler`].
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: Fn(&mut InterceptWriter<'_>, &Request) + Send + Sync,
{
    FnHandler { func }
}

#[async_trait]
impl<F> ResourceHandler for FnHandler<F>
where
    F: Fn(&mut InterceptWriter<'_>, &Request) + Send + Sync,
{
    async fn call(&self, writer: &mut InterceptWriter<'_>, request: &Request) {
        (self.func)(writer, request)
    }
}

/// Response monitor built from a closure. See [`monitor_fn`].
#[derive(Clone)]
pub struct FnMonitor<F> {
    name: &'static str,
    func: F,
}

/// Wrap a synchronous closure as a [`ResponseMonitor`].
pub fn monitor_fn<F>(name: &'static str, func: F) -> FnMonitor<F>
where
    F: Fn(&mut InterceptWriter<'_>, &Request, &CapturedResponse) + Send + Sync,
{
    FnMonitor { name, func }
}

#[async_trait]
impl<F> ResponseMonitor for FnMonitor<F>
where
    F: Fn(&mut InterceptWriter<'_>, &Request, &CapturedResponse) + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn observe(
        &self,
        writer: &mut InterceptWriter<'_>,
        request: &Request,
        captured: &CapturedResponse,
    ) {
        (self.func)(writer, request, captured)
    }
}
