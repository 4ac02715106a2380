//! `PgLocalAccountStore` against a live `PostgreSQL` database.
//!
//! These tests require `DATABASE_URL` pointing at a disposable database.
//!
//! Run with: `cargo test -p steward-link-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use steward_link_core::{AccountId, Email};
use steward_link_integration_tests::remote_account;
use steward_link_service::db::{self, LocalAccountStore, PgLocalAccountStore, RepositoryError};
use steward_link_service::models::{LocalAccount, LocalAccountBuilder};

async fn store() -> PgLocalAccountStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    sqlx::migrate!("../service/migrations").run(&pool).await.unwrap();
    PgLocalAccountStore::new(pool, Duration::from_secs(60))
}

fn account(id: i64, email: &str) -> LocalAccount {
    let mut remote = remote_account();
    remote.id = AccountId::new(id);
    remote.email = Email::parse(email).unwrap();
    LocalAccount::from_remote(remote).unwrap()
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database in DATABASE_URL"]
async fn test_save_get_delete() {
    let store = store().await;
    let id = AccountId::new(9_000_001);
    store.delete(id).await.unwrap();

    store.save(&account(9_000_001, "pg-a@x.com")).await.unwrap();
    let loaded = store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(loaded.email().as_str(), "pg-a@x.com");
    assert_eq!(loaded.zone(), Some("Europe/Paris"));
    assert!(loaded.cached_remote().is_none());

    assert!(store.delete(id).await.unwrap());
    assert!(store.get_by_id(id).await.unwrap().is_none());
    assert!(!store.delete(id).await.unwrap());
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database in DATABASE_URL"]
async fn test_save_is_upsert() {
    let store = store().await;
    let id = AccountId::new(9_000_002);
    store.delete(id).await.unwrap();

    let mut account = account(9_000_002, "pg-b@x.com");
    store.save(&account).await.unwrap();
    account.set_locale(Some("de".to_owned()));
    store.save(&account).await.unwrap();

    let loaded = store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(loaded.stored_locale(), Some("de"));

    store.delete(id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database in DATABASE_URL"]
async fn test_get_by_email_returns_lowest_id() {
    let store = store().await;
    for id in [9_000_004, 9_000_003] {
        store.delete(AccountId::new(id)).await.unwrap();
        store.save(&account(id, "pg-c@x.com")).await.unwrap();
    }

    let email = Email::parse("pg-c@x.com").unwrap();
    let found = store.get_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.account_id(), Some(AccountId::new(9_000_003)));

    for id in [9_000_003, 9_000_004] {
        store.delete(AccountId::new(id)).await.unwrap();
    }
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database in DATABASE_URL"]
async fn test_save_without_id_fails() {
    let store = store().await;
    let unsaved = LocalAccountBuilder::new()
        .email(Email::parse("pg-d@x.com").unwrap())
        .identity_id("prov-d")
        .build()
        .unwrap();

    assert!(matches!(
        store.save(&unsaved).await,
        Err(RepositoryError::MissingId)
    ));
}
