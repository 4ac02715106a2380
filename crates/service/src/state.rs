//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::db::LocalAccountStore;
use crate::services::{LocalAccountProvider, RequestGate};
use crate::steward::AccountSteward;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the account store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServiceConfig,
    store: Arc<dyn LocalAccountStore>,
    accounts: LocalAccountProvider,
    gate: RequestGate,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `store` - Local account storage
    /// * `steward` - Account Steward access
    #[must_use]
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn LocalAccountStore>,
        steward: Arc<dyn AccountSteward>,
    ) -> Self {
        let accounts = LocalAccountProvider::new(Arc::clone(&store), steward);
        let gate = RequestGate::new(accounts.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                accounts,
                gate,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Get a reference to the local account storage.
    #[must_use]
    pub fn store(&self) -> &dyn LocalAccountStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the local account provider.
    #[must_use]
    pub fn accounts(&self) -> &LocalAccountProvider {
        &self.inner.accounts
    }

    /// Get a reference to the request gate.
    #[must_use]
    pub fn gate(&self) -> &RequestGate {
        &self.inner.gate
    }
}
