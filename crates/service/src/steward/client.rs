//! `reqwest` client for the Account Steward REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use url::Url;

use super::{AccountSteward, OnBehalfOf, RemoteAccount, StewardError};
use crate::config::StewardConfig;

/// Header carrying the end user's login email.
pub const ON_BEHALF_OF_EMAIL: &str = "x-on-behalf-of-email";
/// Header carrying the end user's identity provider ID.
pub const ON_BEHALF_OF_IDENTITY_ID: &str = "x-on-behalf-of-identity-id";
/// Header carrying the end user's account ID, once known.
pub const ON_BEHALF_OF_ACCOUNT_ID: &str = "x-on-behalf-of-account-id";

/// Maximum number of response body characters kept in errors and logs.
const BODY_EXCERPT_LEN: usize = 500;

/// Client for the Account Steward REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct StewardClient {
    inner: Arc<StewardClientInner>,
}

struct StewardClientInner {
    client: reqwest::Client,
    base_url: Url,
    service_token: SecretString,
}

impl StewardClient {
    /// Create a new Account Steward client.
    ///
    /// # Errors
    ///
    /// Returns `StewardError::InvalidRequest` if the base URL can't carry
    /// path segments, `StewardError::Http` if the HTTP client can't be built.
    pub fn new(config: &StewardConfig) -> Result<Self, StewardError> {
        if config.api_url.cannot_be_a_base() {
            return Err(StewardError::InvalidRequest(format!(
                "{} can't be used as a base URL",
                config.api_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("steward-link/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(StewardClientInner {
                client,
                base_url: config.api_url.clone(),
                service_token: config.service_token.clone(),
            }),
        })
    }

    /// Build `{base_url}/accounts/{login_id}`, percent-encoding the login ID.
    fn account_url(&self, login_id: &str) -> Result<Url, StewardError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StewardError::InvalidRequest("base URL can't be a base".to_string()))?
            .pop_if_empty()
            .push("accounts")
            .push(login_id);
        Ok(url)
    }
}

#[async_trait]
impl AccountSteward for StewardClient {
    #[instrument(skip(self, on_behalf_of), fields(login_id = %login_id))]
    async fn get_account(
        &self,
        login_id: &str,
        on_behalf_of: &OnBehalfOf,
    ) -> Result<RemoteAccount, StewardError> {
        if login_id.trim().is_empty() {
            return Err(StewardError::InvalidRequest(
                "account login ID can't be empty".to_string(),
            ));
        }

        let url = self.account_url(login_id)?;

        let mut request = self
            .inner
            .client
            .get(url)
            .bearer_auth(self.inner.service_token.expose_secret())
            .header(ACCEPT, "application/json")
            .header(ON_BEHALF_OF_EMAIL, on_behalf_of.email.as_str())
            .header(ON_BEHALF_OF_IDENTITY_ID, on_behalf_of.identity_id.as_str());
        if let Some(account_id) = on_behalf_of.account_id {
            request = request.header(ON_BEHALF_OF_ACCOUNT_ID, account_id.to_string());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("Account Steward has no such account");
            return Err(StewardError::NotFound(login_id.to_owned()));
        }

        let response_text = response.text().await?;
        let excerpt: String = response_text.chars().take(BODY_EXCERPT_LEN).collect();

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt,
                "Account Steward returned non-success status"
            );
            return Err(StewardError::Status {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt,
                "Failed to parse Account Steward response"
            );
            StewardError::Parse(e)
        })
    }
}
