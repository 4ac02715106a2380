//! Authentication extractor.
//!
//! The service runs behind an API gateway that authenticates the caller and
//! forwards the identity in the `X-Endpoint-API-UserInfo` header: base64 JSON
//! (`{"id": ..., "email": ..., "issuer": ...}`), URL-safe or standard
//! alphabet, padding optional.

use axum::{extract::FromRequestParts, http::request::Parts};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};

use crate::error::AppError;
use crate::models::AuthenticatedUser;

/// Header carrying the gateway-authenticated user.
pub const USER_INFO_HEADER: &str = "x-endpoint-api-userinfo";

/// Extractor that optionally gets the authenticated user.
///
/// An absent header yields `None`; a header that can't be decoded rejects the
/// request with 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalUser(user): OptionalUser) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.email),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_INFO_HEADER) else {
            return Ok(Self(None));
        };

        let user = value
            .to_str()
            .ok()
            .and_then(decode_user_info)
            .ok_or_else(|| {
                tracing::debug!("Malformed user info header");
                AppError::Unauthorized("Invalid user info".to_string())
            })?;

        Ok(Self(Some(user)))
    }
}

/// Decode the gateway user info header value.
fn decode_user_info(value: &str) -> Option<AuthenticatedUser> {
    let trimmed = value.trim().trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()?;
    let user: AuthenticatedUser = serde_json::from_slice(&bytes).ok()?;
    (!user.id.trim().is_empty()).then_some(user)
}
