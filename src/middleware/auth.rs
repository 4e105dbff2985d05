//! Cookie-based request authorizers.
//!
//! [`RequireCookie`] intercepts every protected request to:
//! 1. Parse the cookies sent with the request
//! 2. Look up the configured session cookie
//! 3. Reject the request with HTTP 401 when it is missing
//! 4. Otherwise send the cookie back on the response (session refresh)
//!
//! Validating the cookie's contents (expiry, signature) is left to the
//! embedding application.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;

use crate::error::Denial;
use crate::intercept::{AuthOutcome, Authorizer, InterceptWriter, Request};

/// Cause recorded when the session cookie is absent.
#[derive(Debug, thiserror::Error)]
#[error("cookie {0} not present in request")]
pub struct MissingCookie(pub String);

/// Deny requests that do not carry the named cookie.
#[derive(Debug, Clone)]
pub struct RequireCookie {
    name: String,
}

impl RequireCookie {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn cookie_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Authorizer for RequireCookie {
    fn name(&self) -> &'static str {
        "require_cookie"
    }

    async fn authorize(&self, writer: &mut InterceptWriter<'_>, request: &Request) -> AuthOutcome {
        let jar = CookieJar::from_headers(request.headers());

        let Some(cookie) = jar.get(&self.name) else {
            tracing::debug!(cookie = %self.name, "session cookie missing");
            return Denial::new(StatusCode::UNAUTHORIZED, MissingCookie(self.name.clone()))
                .with_message(format!("missing cookie for {}", self.name))
                .into();
        };

        tracing::debug!(cookie = %self.name, "session cookie present");
        writer.set_cookie(cookie);

        AuthOutcome::Allow
    }
}

/// Allow everything. Useful as a slot for per-route logging or stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    fn name(&self) -> &'static str {
        "allow_all"
    }

    async fn authorize(&self, _writer: &mut InterceptWriter<'_>, request: &Request) -> AuthOutcome {
        tracing::debug!(method = %request.method(), uri = %request.uri(), "allowing request");
        AuthOutcome::Allow
    }
}
