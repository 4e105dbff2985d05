//! Response monitors that report on what a handler produced.

use async_trait::async_trait;
use axum::http::header;

use crate::intercept::{CapturedResponse, InterceptWriter, Request, ResponseMonitor};

/// Log body size and any `Set-Cookie` header once the handler has finished.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseLogger;

#[async_trait]
impl ResponseMonitor for ResponseLogger {
    fn name(&self) -> &'static str {
        "response_logger"
    }

    async fn observe(
        &self,
        writer: &mut InterceptWriter<'_>,
        request: &Request,
        captured: &CapturedResponse,
    ) {
        let set_cookie = writer
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info!(
            uri = %request.uri(),
            chunks = captured.len(),
            bytes = captured.total_bytes(),
            set_cookie,
            "response captured"
        );
    }
}
