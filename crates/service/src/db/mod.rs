//! Local account persistence.
//!
//! # Database
//!
//! Stores the local lightweight copy of ecosystem accounts only (the Account
//! Steward is the source of truth):
//!
//! ## Tables
//!
//! - `local_account` - Local accounts, keyed by the ecosystem account ID and
//!   indexed by login email and identity ID
//!
//! # Migrations
//!
//! Migrations are stored in `crates/service/migrations/` and run via:
//! ```bash
//! cargo run -p steward-link-cli -- migrate
//! ```
//!
//! Without a configured database the service falls back to
//! [`MemoryLocalAccountStore`], which keeps accounts for the process lifetime.

pub mod local_accounts;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use steward_link_core::{AccountId, Email};
use thiserror::Error;

pub use local_accounts::PgLocalAccountStore;
pub use memory::MemoryLocalAccountStore;

use crate::models::LocalAccount;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Only accounts with an ecosystem account ID can be stored.
    #[error("LocalAccount.id can't be null")]
    MissingId,
}

/// Storage of local accounts.
///
/// Implementations keep the remote account a `LocalAccount` was initialized
/// from out of storage; loaded accounts never carry one.
#[async_trait]
pub trait LocalAccountStore: Send + Sync {
    /// Get an account by its ecosystem account ID.
    async fn get_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, RepositoryError>;

    /// Get the first account (lowest ID) with the given login email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<LocalAccount>, RepositoryError>;

    /// Insert or replace the account.
    ///
    /// Returns `RepositoryError::MissingId` if the account has no ID yet.
    async fn save(&self, account: &LocalAccount) -> Result<(), RepositoryError>;

    /// Delete the account, returning whether it existed.
    async fn delete(&self, id: AccountId) -> Result<bool, RepositoryError>;

    /// Check that the storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
