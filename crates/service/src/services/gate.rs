//! Resolution of the caller's local account for request handlers.

use crate::error::{AppError, set_sentry_user};
use crate::models::{AuthenticatedUser, LocalAccount};

use super::local_account::{AccountError, LocalAccountProvider};

/// Gate run by endpoints that need the caller's local account.
#[derive(Clone)]
pub struct RequestGate {
    accounts: LocalAccountProvider,
}

impl RequestGate {
    #[must_use]
    pub const fn new(accounts: LocalAccountProvider) -> Self {
        Self { accounts }
    }

    /// Returns the local account of the authenticated user, creating it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without an authenticated user,
    /// `AppError::NotFound` if the Account Steward doesn't know the user, and
    /// `AppError::TryAgainLater` for any other failure.
    pub async fn check_local_account(
        &self,
        user: Option<&AuthenticatedUser>,
    ) -> Result<LocalAccount, AppError> {
        let user = user.ok_or_else(|| AppError::Unauthorized("User is unauthorized.".to_owned()))?;

        let account = self
            .accounts
            .resolve(user.email.clone(), &user.id, None)
            .await
            .map_err(|e| match e {
                AccountError::NotFound(_) => {
                    AppError::NotFound(format!("Account not found for Identity ID {}", user.id))
                }
                other => {
                    tracing::error!(
                        identity_id = %user.id,
                        error = %other,
                        "Local account resolution failed"
                    );
                    AppError::TryAgainLater
                }
            })?;

        set_sentry_user(&user.id, Some(account.email().as_str()));
        Ok(account)
    }
}
