//! The service local lightweight account.
//!
//! A `LocalAccount` is the local representation of an ecosystem account
//! managed by the Account Steward. It carries just enough of the remote
//! account to act as owner of local entities and to render account-specific
//! values (language, domicile, time zone) without a remote round-trip.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use steward_link_core::{AccountId, Domicile, DomicileError, Email, LanguageTag};
use thiserror::Error;

use crate::config::AccountDefaults;
use crate::steward::{AccountSteward, OnBehalfOf, RemoteAccount, StewardError};

/// Time zone applied when the remote account has none.
pub const DEFAULT_ZONE: &str = "Europe/Paris";

/// Errors raised by local account construction and accessors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocalAccountError {
    /// Builder without login email.
    #[error("Account email is mandatory")]
    MissingEmail,

    /// Builder without identity provider ID.
    #[error("Account Identity ID is mandatory")]
    MissingIdentityId,

    /// The stored or preferred domicile isn't supported.
    #[error(transparent)]
    UnsupportedDomicile(#[from] DomicileError),

    /// The account has not been initialized from the remote account yet.
    #[error("LocalAccount.zone property can't be empty")]
    MissingZone,

    /// The stored zone isn't an IANA time-zone ID.
    #[error("invalid time-zone ID: {0}")]
    InvalidZone(String),
}

/// Errors raised while initializing a local account from the remote account.
#[derive(Debug, Error)]
pub enum InitError {
    /// The remote account can't be retrieved.
    #[error(transparent)]
    Remote(#[from] StewardError),

    /// The remote account can't back a local account.
    #[error(transparent)]
    Invalid(#[from] LocalAccountError),
}

/// Builder for a not yet initialized [`LocalAccount`].
///
/// Mandatory properties are the login email and the identity ID. Without an
/// account ID the resulting account can't be saved until it's initialized
/// from the remote account.
#[derive(Debug, Clone, Default)]
pub struct LocalAccountBuilder {
    email: Option<Email>,
    identity_id: Option<String>,
    account_id: Option<AccountId>,
}

impl LocalAccountBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }

    #[must_use]
    pub fn identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.identity_id = Some(identity_id.into());
        self
    }

    #[must_use]
    pub const fn account_id(mut self, account_id: Option<AccountId>) -> Self {
        self.account_id = account_id;
        self
    }

    #[must_use]
    pub const fn get_email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    #[must_use]
    pub fn get_identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }

    #[must_use]
    pub const fn get_account_id(&self) -> Option<AccountId> {
        self.account_id
    }

    /// Build the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or a non-blank identity ID is missing.
    pub fn build(self) -> Result<LocalAccount, LocalAccountError> {
        let email = self.email.ok_or(LocalAccountError::MissingEmail)?;
        let identity_id = self
            .identity_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(LocalAccountError::MissingIdentityId)?;

        Ok(LocalAccount {
            id: self.account_id,
            email,
            identity_id,
            locale: None,
            domicile: None,
            zone: None,
            remote: None,
        })
    }
}

/// The service local lightweight account.
///
/// Equality and hashing are based on the account ID only.
#[derive(Clone)]
pub struct LocalAccount {
    id: Option<AccountId>,
    email: Email,
    identity_id: String,
    locale: Option<String>,
    domicile: Option<String>,
    zone: Option<String>,
    /// Remote account this instance was initialized from; never persisted.
    remote: Option<Arc<RemoteAccount>>,
}

impl LocalAccount {
    /// Schema version marker written with every save (2017-10-21 08:00 GMT+2).
    pub const MODEL_VERSION: i64 = 1_508_565_600_000;

    /// Construct a fully initialized local account from the remote account.
    ///
    /// # Errors
    ///
    /// Returns `LocalAccountError::MissingIdentityId` if the remote account has
    /// a blank identity ID.
    pub fn from_remote(remote: RemoteAccount) -> Result<Self, LocalAccountError> {
        let mut account = LocalAccountBuilder::new()
            .account_id(Some(remote.id))
            .email(remote.email.clone())
            .identity_id(remote.identity_id.clone())
            .build()?;
        account.apply_remote(Arc::new(remote))?;
        Ok(account)
    }

    /// Reassemble an account from persisted properties.
    #[must_use]
    pub const fn restore(
        id: AccountId,
        email: Email,
        identity_id: String,
        locale: Option<String>,
        domicile: Option<String>,
        zone: Option<String>,
    ) -> Self {
        Self {
            id: Some(id),
            email,
            identity_id,
            locale,
            domicile,
            zone,
            remote: None,
        }
    }

    /// Initialize local properties from the remote account.
    ///
    /// The account is left untouched when the remote account is rejected.
    ///
    /// # Errors
    ///
    /// Returns `InitError::Remote` if the remote account can't be retrieved
    /// (`StewardError::NotFound` if it doesn't exist), and
    /// `InitError::Invalid` if it has a blank identity ID.
    pub async fn init(&mut self, steward: &dyn AccountSteward) -> Result<(), InitError> {
        let remote = self.remote_account(steward).await?;
        self.apply_remote(remote)?;
        Ok(())
    }

    fn apply_remote(&mut self, remote: Arc<RemoteAccount>) -> Result<(), LocalAccountError> {
        if remote.identity_id.trim().is_empty() {
            return Err(LocalAccountError::MissingIdentityId);
        }

        self.id = Some(remote.id);
        self.email = remote.email.clone();
        self.identity_id.clone_from(&remote.identity_id);
        self.locale.clone_from(&remote.locale);
        self.domicile = remote.business.as_ref().and_then(|b| b.domicile.clone());
        self.zone = Some(
            remote
                .zone_id
                .as_deref()
                .filter(|zone| !zone.trim().is_empty())
                .unwrap_or(DEFAULT_ZONE)
                .to_owned(),
        );
        self.remote = Some(remote);
        Ok(())
    }

    /// Retrieve the remote account, authenticated by the service account on
    /// behalf of this account's email and identity ID.
    ///
    /// The remote account this instance was initialized from is returned
    /// without a round-trip.
    ///
    /// # Errors
    ///
    /// Returns `StewardError::NotFound` if the remote account doesn't exist.
    pub async fn remote_account(
        &self,
        steward: &dyn AccountSteward,
    ) -> Result<Arc<RemoteAccount>, StewardError> {
        if let Some(remote) = &self.remote {
            return Ok(Arc::clone(remote));
        }

        let remote = steward
            .get_account(&self.login_id(), &self.on_behalf_of())
            .await?;
        Ok(Arc::new(remote))
    }

    /// The ID the remote account is looked up by: the account ID once known,
    /// the identity ID before.
    #[must_use]
    pub fn login_id(&self) -> String {
        self.id
            .map_or_else(|| self.identity_id.clone(), |id| id.to_string())
    }

    #[must_use]
    pub fn on_behalf_of(&self) -> OnBehalfOf {
        OnBehalfOf {
            email: self.email.clone(),
            identity_id: self.identity_id.clone(),
            account_id: self.id,
        }
    }

    /// Returns the account ID within the ecosystem, if already known.
    #[must_use]
    pub const fn account_id(&self) -> Option<AccountId> {
        self.id
    }

    /// The login email of the account.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Sets the login email.
    ///
    /// A user might change the login email under the umbrella of the same
    /// login provider; the identity ID remains the same in that case.
    pub fn set_email(&mut self, email: Email) {
        self.email = email;
    }

    /// The email account unique identification within the login provider.
    #[must_use]
    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    /// The stored language, as received.
    #[must_use]
    pub fn stored_locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Sets the preferred language (ISO 639 alpha-2 or alpha-3 code).
    pub fn set_locale(&mut self, locale: Option<String>) {
        self.locale = locale;
    }

    /// The stored domicile code, as received.
    #[must_use]
    pub fn stored_domicile(&self) -> Option<&str> {
        self.domicile.as_deref()
    }

    /// Sets the ISO 3166 alpha-2 domicile code. Not validated until read.
    pub fn set_domicile(&mut self, domicile: Option<String>) {
        self.domicile = domicile;
    }

    /// The stored time-zone ID.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn set_zone(&mut self, zone: impl Into<String>) {
        self.zone = Some(zone.into());
    }

    /// The remote account held in memory, if this instance was initialized from one.
    #[must_use]
    pub fn cached_remote(&self) -> Option<&RemoteAccount> {
        self.remote.as_deref()
    }

    /// A copy without the in-memory remote account, as it would be loaded from storage.
    #[must_use]
    pub fn without_remote(&self) -> Self {
        Self {
            remote: None,
            ..self.clone()
        }
    }

    /// Returns the account time zone, used to render date-time properties of
    /// resources owned by this account.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone is missing or not an IANA time-zone ID.
    pub fn zone_id(&self) -> Result<Tz, LocalAccountError> {
        let zone = self.zone.as_deref().ok_or(LocalAccountError::MissingZone)?;
        zone.parse::<Tz>()
            .map_err(|_| LocalAccountError::InvalidZone(zone.to_owned()))
    }

    /// Renders an instant in the account time zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the account zone is unusable, see [`Self::zone_id`].
    pub fn to_local(&self, instant: DateTime<Utc>) -> Result<DateTime<Tz>, LocalAccountError> {
        Ok(instant.with_timezone(&self.zone_id()?))
    }

    /// Returns the account locale, falling back to the service default.
    #[must_use]
    pub fn locale(&self, defaults: &AccountDefaults) -> LanguageTag {
        self.locale_or(None, defaults)
    }

    /// Returns the preferred locale if given, otherwise the account locale,
    /// otherwise the service default.
    #[must_use]
    pub fn locale_or(
        &self,
        preferred: Option<LanguageTag>,
        defaults: &AccountDefaults,
    ) -> LanguageTag {
        if let Some(locale) = preferred {
            return locale;
        }

        match self.locale.as_deref().map(str::trim) {
            None | Some("") => defaults.locale.clone(),
            Some(stored) => LanguageTag::parse(stored).unwrap_or_else(|e| {
                tracing::warn!(
                    account_id = ?self.id,
                    locale = stored,
                    error = %e,
                    "Unparsable account locale, using service default"
                );
                defaults.locale.clone()
            }),
        }
    }

    /// Returns the account domicile, falling back to the service default.
    ///
    /// # Errors
    ///
    /// Returns `LocalAccountError::UnsupportedDomicile` if the stored value
    /// isn't a supported domicile.
    pub fn domicile(&self, defaults: &AccountDefaults) -> Result<Domicile, LocalAccountError> {
        self.domicile_or(None, defaults)
    }

    /// Returns the preferred domicile if given, otherwise the account
    /// domicile, otherwise the service default.
    ///
    /// # Errors
    ///
    /// Returns `LocalAccountError::UnsupportedDomicile` if the chosen value
    /// isn't a supported domicile.
    pub fn domicile_or(
        &self,
        preferred: Option<&str>,
        defaults: &AccountDefaults,
    ) -> Result<Domicile, LocalAccountError> {
        let code = match preferred {
            Some(code) => code,
            None => match self.domicile.as_deref().filter(|d| !d.trim().is_empty()) {
                Some(stored) => stored,
                None => {
                    tracing::warn!(
                        account_id = ?self.id,
                        domicile = %defaults.domicile,
                        "Using service default domicile"
                    );
                    return Ok(defaults.domicile);
                }
            },
        };
        Ok(code.parse::<Domicile>()?)
    }
}

impl PartialEq for LocalAccount {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LocalAccount {}

impl Hash for LocalAccount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAccount")
            .field("id", &self.id)
            .field("email", &self.email.as_str())
            .field("identity_id", &self.identity_id)
            .field("locale", &self.locale)
            .field("domicile", &self.domicile)
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LocalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map_or_else(|| "-".to_owned(), |id| id.to_string());
        write!(
            f,
            "LocalAccount{{id={id}, email={}, identityId={}, locale={}, domicile={}, zone={}}}",
            self.email,
            self.identity_id,
            self.locale.as_deref().unwrap_or("-"),
            self.domicile.as_deref().unwrap_or("-"),
            self.zone.as_deref().unwrap_or("-"),
        )
    }
}
