//! Account Steward REST API access.
//!
//! The Account Steward microservice owns the ecosystem accounts. This service
//! only ever reads a single account, authenticated with its own service
//! account on behalf of the end user the account belongs to.
//!
//! - [`AccountSteward`] - the narrow contract the local account cache depends on
//! - [`StewardClient`] - `reqwest` implementation of that contract

mod client;
pub mod types;

pub use client::StewardClient;
pub use types::{AccountBusiness, OnBehalfOf, RemoteAccount};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the Account Steward.
#[derive(Debug, Error)]
pub enum StewardError {
    /// The requested account doesn't exist.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status other than 404.
    #[error("Account Steward returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The response body isn't a valid account.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Read access to remote accounts.
#[async_trait]
pub trait AccountSteward: Send + Sync {
    /// Fetch the account identified by `login_id`: either the numeric account
    /// ID or the identity provider's ID of the account's login.
    ///
    /// # Errors
    ///
    /// Returns [`StewardError::NotFound`] if no such account exists, any other
    /// variant for transport or protocol failures.
    async fn get_account(
        &self,
        login_id: &str,
        on_behalf_of: &OnBehalfOf,
    ) -> Result<RemoteAccount, StewardError>;
}
