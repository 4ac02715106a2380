//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type rendered as a JSON error body. Server-side
//! failures are logged at the point they happen, where the detail is known;
//! the Sentry tracing layer turns that log into the single Sentry event.
//! All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Public message of every server-side failure.
pub const TRY_AGAIN_LATER: &str = "Try again later";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Server-side failure; the detail is logged where it occurred, the client
    /// only learns to retry.
    #[error("Try again later")]
    TryAgainLater,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: u16,
    message: &'a str,
}

impl AppError {
    /// HTTP status code of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TryAgainLater => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::Unauthorized(msg) | Self::NotFound(msg) | Self::BadRequest(msg) => msg,
            Self::TryAgainLater => TRY_AGAIN_LATER,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                code: status.as_u16(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this once the caller's account is known to associate errors with it.
pub fn set_sentry_user(identity_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(identity_id.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
