//! Local account management commands.
//!
//! # Usage
//!
//! ```bash
//! sl-cli account show --id 42
//! sl-cli account show --email user@example.com
//! sl-cli account delete --id 42
//! ```
//!
//! # Environment Variables
//!
//! - `STEWARD_LINK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use std::time::Duration;

use serde_json::json;
use steward_link_core::{AccountId, Email};
use steward_link_service::db::{LocalAccountStore, PgLocalAccountStore};
use steward_link_service::models::LocalAccount;

use super::{CommandError, connect};

async fn store() -> Result<PgLocalAccountStore, CommandError> {
    Ok(PgLocalAccountStore::new(connect().await?, Duration::ZERO))
}

/// Print a local account, looked up by ID or login email, as JSON.
///
/// # Errors
///
/// Returns an error if the lookup key is invalid or the database fails.
pub async fn show(id: Option<i64>, email: Option<&str>) -> Result<(), CommandError> {
    let store = store().await?;

    let account = match (id, email) {
        (Some(id), _) => store.get_by_id(AccountId::new(id)).await?,
        (None, Some(email)) => {
            let email =
                Email::parse(email).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
            store.get_by_email(&email).await?
        }
        (None, None) => {
            return Err(CommandError::InvalidArgument(
                "either --id or --email is required".to_owned(),
            ));
        }
    };

    match account {
        Some(account) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{:#}", to_json(&account));
            }
        }
        None => tracing::warn!("Local account not found"),
    }
    Ok(())
}

/// Delete a local account.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn delete(id: i64) -> Result<(), CommandError> {
    let store = store().await?;
    let id = AccountId::new(id);

    if store.delete(id).await? {
        tracing::info!("Local account {id} deleted");
    } else {
        tracing::warn!("Local account {id} not found");
    }
    Ok(())
}

fn to_json(account: &LocalAccount) -> serde_json::Value {
    json!({
        "id": account.account_id(),
        "email": account.email(),
        "identityId": account.identity_id(),
        "locale": account.stored_locale(),
        "domicile": account.stored_domicile(),
        "zone": account.zone(),
    })
}
