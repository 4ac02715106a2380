//! Integration tests for Steward Link.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p steward-link-integration-tests
//!
//! # Including the PostgreSQL store tests
//! DATABASE_URL=postgres://... cargo test -p steward-link-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `message_api` - Message endpoint through the full router
//! - `account_gate` - Local account resolution through the router
//! - `steward_client` - `StewardClient` against an in-process Account Steward
//! - `pg_store` - `PgLocalAccountStore` against a live database (ignored by default)
//!
//! This library holds the fixtures shared by those tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use steward_link_core::{AccountId, Email};
use steward_link_service::config::{AccountDefaults, ServiceConfig, StewardConfig};
use steward_link_service::db::{LocalAccountStore, MemoryLocalAccountStore, RepositoryError};
use steward_link_service::middleware::USER_INFO_HEADER;
use steward_link_service::models::{AuthenticatedUser, LocalAccount};
use steward_link_service::routes;
use steward_link_service::state::AppState;
use steward_link_service::steward::{
    AccountBusiness, AccountSteward, OnBehalfOf, RemoteAccount, StewardError,
};
use tower::ServiceExt;
use url::Url;

/// High-entropy token accepted by the configuration checks.
pub const TEST_TOKEN: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

/// Service configuration pointing at a Steward that is never contacted.
///
/// # Panics
///
/// Never; the hard-coded URL is valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config(require_account: bool) -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        database_url: None,
        require_account,
        defaults: AccountDefaults::default(),
        entity_cache_ttl: Duration::from_secs(3600),
        steward: steward_config(Url::parse("http://127.0.0.1:9").unwrap()),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Account Steward configuration for `api_url`.
#[must_use]
pub fn steward_config(api_url: Url) -> StewardConfig {
    StewardConfig {
        api_url,
        service_token: SecretString::from(TEST_TOKEN),
        timeout: Duration::from_secs(5),
    }
}

/// The remote account used by most scenarios: ID 42, locale `fr`, empty zone.
///
/// # Panics
///
/// Never; the hard-coded email is valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn remote_account() -> RemoteAccount {
    RemoteAccount {
        id: AccountId::new(42),
        email: Email::parse("a@x.com").unwrap(),
        identity_id: "prov-1".to_owned(),
        locale: Some("fr".to_owned()),
        zone_id: Some(String::new()),
        business: Some(AccountBusiness {
            domicile: Some("CZ".to_owned()),
        }),
    }
}

/// The gateway user matching [`remote_account`].
///
/// # Panics
///
/// Never; the hard-coded email is valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: "prov-1".to_owned(),
        email: Email::parse("a@x.com").unwrap(),
        issuer: Some("https://accounts.example.net".to_owned()),
    }
}

/// Encode a user the way the API gateway forwards it: URL-safe base64 JSON
/// without padding.
///
/// # Panics
///
/// Never; `AuthenticatedUser` always serializes.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn encode_user_info(user: &AuthenticatedUser) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(user).unwrap())
}

/// Account Steward double answering with one account (or none).
#[derive(Default)]
pub struct FakeSteward {
    account: Option<RemoteAccount>,
    failure: Option<u16>,
    calls: Mutex<Vec<String>>,
}

impl FakeSteward {
    /// Steward knowing exactly `account`.
    #[must_use]
    pub fn with_account(account: RemoteAccount) -> Self {
        Self {
            account: Some(account),
            ..Self::default()
        }
    }

    /// Steward knowing no account at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Steward failing every call with HTTP `status`.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self {
            failure: Some(status),
            ..Self::default()
        }
    }

    /// Login IDs requested so far.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountSteward for FakeSteward {
    async fn get_account(
        &self,
        login_id: &str,
        _on_behalf_of: &OnBehalfOf,
    ) -> Result<RemoteAccount, StewardError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(login_id.to_owned());
        }
        if let Some(status) = self.failure {
            return Err(StewardError::Status {
                status,
                body: "unavailable".to_owned(),
            });
        }
        self.account
            .clone()
            .filter(|a| a.id.to_string() == login_id || a.identity_id == login_id)
            .ok_or_else(|| StewardError::NotFound(login_id.to_owned()))
    }
}

/// Memory store counting writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryLocalAccountStore,
    saves: AtomicUsize,
}

impl CountingStore {
    /// Number of `save` calls so far.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalAccountStore for CountingStore {
    async fn get_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, RepositoryError> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<LocalAccount>, RepositoryError> {
        self.inner.get_by_email(email).await
    }

    async fn save(&self, account: &LocalAccount) -> Result<(), RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(account).await
    }

    async fn delete(&self, id: AccountId) -> Result<bool, RepositoryError> {
        self.inner.delete(id).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.inner.ping().await
    }
}

/// A router with its collaborators kept at hand for assertions.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<CountingStore>,
    pub steward: Arc<FakeSteward>,
}

impl TestApp {
    #[must_use]
    pub fn new(require_account: bool, steward: FakeSteward) -> Self {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(steward);
        let state = AppState::new(
            test_config(require_account),
            store.clone(),
            steward.clone(),
        );

        Self {
            router: routes::router(state.clone()),
            state,
            store,
            steward,
        }
    }

    /// Send a request through the router, returning the status and JSON body
    /// (`Value::Null` for non-JSON bodies).
    ///
    /// # Panics
    ///
    /// Panics if the request can't be built or the body can't be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&AuthenticatedUser>,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_INFO_HEADER, encode_user_info(user));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
