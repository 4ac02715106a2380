//! `PostgreSQL` local account repository.
//!
//! Queries use the runtime `query_as` API so the crate builds without a live
//! database. Loaded accounts are cached in memory (`moka`) for the configured
//! entity time-to-live; saves refresh and deletes invalidate the cache.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use sqlx::PgPool;
use steward_link_core::{AccountId, Email};
use tracing::{debug, instrument};

use super::{LocalAccountStore, RepositoryError};
use crate::models::LocalAccount;

/// Maximum number of cached local accounts.
const CACHE_CAPACITY: u64 = 10_000;

/// Internal row type for `local_account` queries.
#[derive(sqlx::FromRow)]
struct LocalAccountRow {
    id: AccountId,
    email: String,
    identity_id: String,
    locale: Option<String>,
    domicile: Option<String>,
    zone: Option<String>,
}

impl TryFrom<LocalAccountRow> for LocalAccount {
    type Error = RepositoryError;

    fn try_from(row: LocalAccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self::restore(
            row.id,
            email,
            row.identity_id,
            row.locale,
            row.domicile,
            row.zone,
        ))
    }
}

/// Local account repository backed by `PostgreSQL`.
///
/// Cheap to clone; clones share the pool and the entity cache.
#[derive(Clone)]
pub struct PgLocalAccountStore {
    pool: PgPool,
    cache: Cache<AccountId, LocalAccount>,
}

impl PgLocalAccountStore {
    /// Create a new repository caching loaded accounts for `ttl`.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { pool, cache }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LocalAccountStore for PgLocalAccountStore {
    #[instrument(skip(self), fields(account_id = %id))]
    async fn get_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, RepositoryError> {
        if let Some(account) = self.cache.get(&id).await {
            debug!("Cache hit for local account");
            return Ok(Some(account));
        }

        let row = sqlx::query_as::<_, LocalAccountRow>(
            r"
            SELECT id, email, identity_id, locale, domicile, zone
            FROM local_account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let account = LocalAccount::try_from(row)?;
                self.cache.insert(id, account.clone()).await;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, email))]
    async fn get_by_email(&self, email: &Email) -> Result<Option<LocalAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, LocalAccountRow>(
            r"
            SELECT id, email, identity_id, locale, domicile, zone
            FROM local_account
            WHERE email = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LocalAccount::try_from).transpose()
    }

    #[instrument(skip(self, account), fields(account_id = ?account.account_id()))]
    async fn save(&self, account: &LocalAccount) -> Result<(), RepositoryError> {
        let id = account.account_id().ok_or(RepositoryError::MissingId)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"
            INSERT INTO local_account
                (id, email, identity_id, locale, domicile, zone, model_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                identity_id = EXCLUDED.identity_id,
                locale = EXCLUDED.locale,
                domicile = EXCLUDED.domicile,
                zone = EXCLUDED.zone,
                model_version = EXCLUDED.model_version,
                updated_at = NOW()
            ",
        )
        .bind(id)
        .bind(account.email())
        .bind(account.identity_id())
        .bind(account.stored_locale())
        .bind(account.stored_domicile())
        .bind(account.zone())
        .bind(LocalAccount::MODEL_VERSION)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.cache.insert(id, account.without_remote()).await;
        debug!("Local account saved");
        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %id))]
    async fn delete(&self, id: AccountId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM local_account WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.cache.invalidate(&id).await;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
