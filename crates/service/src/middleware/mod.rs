//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (new hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! The caller's identity is read per handler through the [`OptionalUser`]
//! extractor.

pub mod auth;
pub mod request_id;

pub use auth::{OptionalUser, USER_INFO_HEADER};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
