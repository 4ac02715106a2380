//! Local account get-or-create.
//!
//! Looks up the local account by account ID (preferred) or login email. On a
//! miss the account is initialized from the Account Steward and saved. Stored
//! accounts are returned as they are; nothing is refreshed on read.

use std::sync::Arc;
use std::time::Instant;

use steward_link_core::{AccountId, Email};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::db::{LocalAccountStore, RepositoryError};
use crate::models::{InitError, LocalAccount, LocalAccountBuilder, LocalAccountError};
use crate::steward::{AccountSteward, StewardError};

/// Errors that can occur while resolving a local account.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The Account Steward has no such account.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// The Account Steward couldn't be reached or answered unexpectedly.
    #[error("Account Steward error: {0}")]
    Steward(StewardError),

    /// Storage failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The account properties are invalid.
    #[error("Invalid account: {0}")]
    Invalid(#[from] LocalAccountError),
}

impl From<StewardError> for AccountError {
    fn from(err: StewardError) -> Self {
        match err {
            StewardError::NotFound(login_id) => Self::NotFound(login_id),
            other => Self::Steward(other),
        }
    }
}

impl From<InitError> for AccountError {
    fn from(err: InitError) -> Self {
        match err {
            InitError::Remote(err) => err.into(),
            InitError::Invalid(err) => Self::Invalid(err),
        }
    }
}

/// Provides local accounts, creating them from the remote account on first use.
#[derive(Clone)]
pub struct LocalAccountProvider {
    store: Arc<dyn LocalAccountStore>,
    steward: Arc<dyn AccountSteward>,
}

impl LocalAccountProvider {
    #[must_use]
    pub fn new(store: Arc<dyn LocalAccountStore>, steward: Arc<dyn AccountSteward>) -> Self {
        Self { store, steward }
    }

    /// Resolve the local account for the given identity.
    ///
    /// # Errors
    ///
    /// See [`Self::init_get`].
    pub async fn resolve(
        &self,
        email: Email,
        identity_id: &str,
        account_id: Option<AccountId>,
    ) -> Result<LocalAccount, AccountError> {
        let builder = LocalAccountBuilder::new()
            .email(email)
            .identity_id(identity_id)
            .account_id(account_id);
        self.init_get(builder).await
    }

    /// Returns the local account matching the builder, creating and saving it
    /// from the remote account if there is none yet.
    ///
    /// The account is looked up by account ID if the builder carries one,
    /// otherwise by login email (first match).
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Invalid` if the builder lacks mandatory properties
    /// or the remote account has a blank identity ID.
    /// Returns `AccountError::NotFound` if the remote account doesn't exist.
    /// Returns `AccountError::Steward` or `AccountError::Repository` if the
    /// remote account can't be retrieved or the local one can't be stored.
    #[instrument(skip(self, builder), fields(account_id = ?builder.get_account_id()))]
    pub async fn init_get(&self, builder: LocalAccountBuilder) -> Result<LocalAccount, AccountError> {
        let mut account = builder.build()?;

        let stored = match account.account_id() {
            Some(id) => self.store.get_by_id(id).await?,
            None => self.store.get_by_email(account.email()).await?,
        };
        if let Some(stored) = stored {
            debug!("Local account found");
            return Ok(stored);
        }

        let started = Instant::now();
        account.init(self.steward.as_ref()).await?;
        self.store.save(&account).await?;

        info!(
            account_id = ?account.account_id(),
            elapsed_ms = started.elapsed().as_millis(),
            "Local account just has been created"
        );
        Ok(account)
    }

    /// Get a local account by its ecosystem account ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the lookup fails.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, AccountError> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Get the first local account with the given login email.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the lookup fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<LocalAccount>, AccountError> {
        Ok(self.store.get_by_email(email).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::db::MemoryLocalAccountStore;
    use crate::steward::{AccountBusiness, OnBehalfOf, RemoteAccount};

    /// Steward answering from a fixed account, recording login IDs.
    #[derive(Default)]
    struct FakeSteward {
        account: Option<RemoteAccount>,
        login_ids: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl AccountSteward for FakeSteward {
        async fn get_account(
            &self,
            login_id: &str,
            _on_behalf_of: &OnBehalfOf,
        ) -> Result<RemoteAccount, StewardError> {
            self.login_ids.lock().unwrap().push(login_id.to_owned());
            if self.fail {
                return Err(StewardError::Status {
                    status: 503,
                    body: "unavailable".to_owned(),
                });
            }
            self.account
                .clone()
                .ok_or_else(|| StewardError::NotFound(login_id.to_owned()))
        }
    }

    /// Store wrapper counting writes.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryLocalAccountStore,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl LocalAccountStore for CountingStore {
        async fn get_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, RepositoryError> {
            self.inner.get_by_id(id).await
        }

        async fn get_by_email(
            &self,
            email: &Email,
        ) -> Result<Option<LocalAccount>, RepositoryError> {
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
            Ok(())
        }
    }

    fn email() -> Email {
        Email::parse("a@x.com").unwrap()
    }

    fn remote() -> RemoteAccount {
        RemoteAccount {
            id: AccountId::new(42),
            email: email(),
            identity_id: "prov-1".to_owned(),
            locale: Some("fr".to_owned()),
            zone_id: Some(String::new()),
            business: Some(AccountBusiness {
                domicile: Some("SK".to_owned()),
            }),
        }
    }

    fn provider(
        store: &Arc<CountingStore>,
        steward: &Arc<FakeSteward>,
    ) -> LocalAccountProvider {
        LocalAccountProvider::new(store.clone(), steward.clone())
    }

    #[tokio::test]
    async fn test_miss_creates_from_remote() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward {
            account: Some(remote()),
            ..FakeSteward::default()
        });

        let account = provider(&store, &steward)
            .resolve(email(), "prov-1", None)
            .await
            .unwrap();

        assert_eq!(account.account_id(), Some(AccountId::new(42)));
        assert_eq!(account.zone(), Some("Europe/Paris"));
        assert_eq!(account.stored_locale(), Some("fr"));
        assert_eq!(account.stored_domicile(), Some("SK"));
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(*steward.login_ids.lock().unwrap(), vec!["prov-1".to_owned()]);

        let saved = store.inner.get_by_id(AccountId::new(42)).await.unwrap();
        assert_eq!(saved.unwrap().identity_id(), "prov-1");
    }

    #[tokio::test]
    async fn test_miss_with_account_id_logs_in_by_id() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward {
            account: Some(remote()),
            ..FakeSteward::default()
        });

        provider(&store, &steward)
            .resolve(email(), "prov-1", Some(AccountId::new(42)))
            .await
            .unwrap();

        assert_eq!(*steward.login_ids.lock().unwrap(), vec!["42".to_owned()]);
    }

    #[tokio::test]
    async fn test_hit_by_email_skips_steward() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward::default());
        let existing = LocalAccount::from_remote(remote()).unwrap();
        store.inner.save(&existing).await.unwrap();

        let account = provider(&store, &steward)
            .resolve(email(), "prov-1", None)
            .await
            .unwrap();

        assert_eq!(account, existing);
        assert!(steward.login_ids.lock().unwrap().is_empty());
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hit_by_id_returns_stored_unchanged() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward::default());
        let mut existing = LocalAccount::from_remote(remote()).unwrap();
        existing.set_locale(Some("de".to_owned()));
        store.inner.save(&existing).await.unwrap();

        let account = provider(&store, &steward)
            .resolve(
                Email::parse("changed@x.com").unwrap(),
                "prov-1",
                Some(AccountId::new(42)),
            )
            .await
            .unwrap();

        assert_eq!(account.stored_locale(), Some("de"));
        assert_eq!(account.email().as_str(), "a@x.com");
        assert!(steward.login_ids.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_not_found_persists_nothing() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward::default());

        let result = provider(&store, &steward)
            .resolve(email(), "prov-1", None)
            .await;

        assert!(matches!(result, Err(AccountError::NotFound(id)) if id == "prov-1"));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_is_not_retried() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward {
            fail: true,
            ..FakeSteward::default()
        });

        let result = provider(&store, &steward)
            .resolve(email(), "prov-1", None)
            .await;

        assert!(matches!(result, Err(AccountError::Steward(_))));
        assert_eq!(steward.login_ids.lock().unwrap().len(), 1);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_identity_is_invalid() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward::default());

        let result = provider(&store, &steward).resolve(email(), " ", None).await;

        assert!(matches!(
            result,
            Err(AccountError::Invalid(LocalAccountError::MissingIdentityId))
        ));
    }

    #[tokio::test]
    async fn test_blank_remote_identity_persists_nothing() {
        let store = Arc::new(CountingStore::default());
        let steward = Arc::new(FakeSteward {
            account: Some(RemoteAccount {
                identity_id: String::new(),
                ..remote()
            }),
            ..FakeSteward::default()
        });

        let result = provider(&store, &steward)
            .resolve(email(), "prov-1", None)
            .await;

        assert!(matches!(
            result,
            Err(AccountError::Invalid(LocalAccountError::MissingIdentityId))
        ));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
        assert!(store.inner.is_empty().await);
    }
}
