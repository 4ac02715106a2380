//! In-memory local account store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use steward_link_core::{AccountId, Email};
use tokio::sync::RwLock;

use super::{LocalAccountStore, RepositoryError};
use crate::models::LocalAccount;

/// Local account store keeping accounts for the lifetime of the process.
///
/// Used when no database is configured, and in tests.
#[derive(Clone, Default)]
pub struct MemoryLocalAccountStore {
    accounts: Arc<RwLock<BTreeMap<AccountId, LocalAccount>>>,
}

impl MemoryLocalAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl LocalAccountStore for MemoryLocalAccountStore {
    async fn get_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, RepositoryError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<LocalAccount>, RepositoryError> {
        // BTreeMap iterates in key order, so the first match has the lowest ID.
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.email() == email)
            .cloned())
    }

    async fn save(&self, account: &LocalAccount) -> Result<(), RepositoryError> {
        let id = account.account_id().ok_or(RepositoryError::MissingId)?;
        self.accounts
            .write()
            .await
            .insert(id, account.without_remote());
        Ok(())
    }

    async fn delete(&self, id: AccountId) -> Result<bool, RepositoryError> {
        Ok(self.accounts.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
