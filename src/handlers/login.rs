//! Login page that issues a session cookie.

use async_trait::async_trait;
use axum_extra::extract::cookie::Cookie;

use crate::intercept::{InterceptWriter, Request, ResourceHandler};

/// Greets the caller and hands out a fresh session cookie.
///
/// Body writes and the cookie may be interleaved freely: the cookie goes to
/// the response head immediately while the body is captured.
#[derive(Debug, Clone)]
pub struct LoginPage {
    cookie_name: String,
}

impl LoginPage {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

/// 128-bit random token, hex encoded.
pub fn session_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

#[async_trait]
impl ResourceHandler for LoginPage {
    async fn call(&self, writer: &mut InterceptWriter<'_>, _request: &Request) {
        writer.write("hello");

        let cookie = Cookie::build((self.cookie_name.clone(), session_token()))
            .path("/")
            .http_only(true)
            .build();
        writer.set_cookie(&cookie);

        writer.write(" buddy");
    }
}
