//! Error types for the interception pipeline and its HTTP adapter.
//!
//! Three kinds of failure exist:
//!
//! - [`Denial`]: an authorizer refused the request. This is the expected
//!   failure path and only ever affects the single request being processed.
//! - [`SinkError`]: the real response sink failed while the pipeline was
//!   flushing captured bytes (usually because the client went away).
//! - [`AppError`]: the axum adapter could not hand the request to the
//!   pipeline at all (unreadable body, pipeline task died). It converts into
//!   an HTTP response with a JSON body.

use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Type-erased error cause carried by a [`Denial`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Rejection produced by an authorizer.
///
/// Carries the underlying cause, the HTTP status code to answer with, and an
/// optional human-readable message. When the message is empty the cause's
/// `Display` output is sent to the client instead.
///
/// The status code is forwarded as-is; any value from the IANA HTTP status
/// code registry is acceptable.
#[derive(Debug, thiserror::Error)]
#[error("request denied ({status}): {cause}")]
pub struct Denial {
    status: StatusCode,
    message: String,
    #[source]
    cause: BoxError,
}

impl Denial {
    /// Create a denial with no explicit message.
    pub fn new(status: StatusCode, cause: impl Into<BoxError>) -> Self {
        Self {
            status,
            message: String::new(),
            cause: cause.into(),
        }
    }

    /// Set the message sent to the client as the response body.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Status code the client receives.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body text the client receives.
    ///
    /// Falls back to the cause's description when no message was supplied.
    pub fn message(&self) -> Cow<'_, str> {
        if self.message.is_empty() {
            Cow::Owned(self.cause.to_string())
        } else {
            Cow::Borrowed(&self.message)
        }
    }

    /// The error that triggered the denial.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }
}

/// Failure writing to the real response sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The receiving side of the response body is gone (client disconnected).
    #[error("client disconnected")]
    Disconnected,

    /// Underlying I/O failure.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the HTTP adapter before or around pipeline execution.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body exceeded the configured limit.
    ///
    /// Returns HTTP 413 Payload Too Large.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Request body could not be read from the connection.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request body")]
    InvalidBody(#[source] axum::Error),

    /// The pipeline task ended without producing a response head
    /// (for example, a callback panicked).
    ///
    /// Returns HTTP 500 Internal Server Error.
    #[error("Pipeline aborted")]
    PipelineAborted,
}

impl AppError {
    /// Classify a body-buffering failure.
    pub fn from_body_error(err: axum::Error) -> Self {
        let over_limit = std::error::Error::source(&err)
            .is_some_and(|source| source.is::<http_body_util::LengthLimitError>());

        if over_limit {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidBody(err)
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "invalid_body"),
            AppError::PipelineAborted => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}
