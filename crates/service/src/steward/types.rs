//! Account Steward wire types.

use serde::{Deserialize, Serialize};
use steward_link_core::{AccountId, Email};

/// An ecosystem account as returned by the Account Steward.
///
/// Only the properties mirrored by the local account are modelled; anything
/// else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAccount {
    pub id: AccountId,
    pub email: Email,
    pub identity_id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub business: Option<AccountBusiness>,
}

/// Business details of an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBusiness {
    /// ISO 3166 alpha-2 country code.
    #[serde(default)]
    pub domicile: Option<String>,
}

/// The end user a service-account request is made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnBehalfOf {
    pub email: Email,
    pub identity_id: String,
    pub account_id: Option<AccountId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_account() {
        let json = r#"{
            "id": 42,
            "email": "a@x.com",
            "identityId": "prov-1",
            "locale": "fr",
            "zoneId": "Europe/Bratislava",
            "business": {"domicile": "SK", "name": "Ignored s.r.o."},
            "role": "ignored"
        }"#;

        let account: RemoteAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.id, AccountId::new(42));
        assert_eq!(account.email.as_str(), "a@x.com");
        assert_eq!(account.identity_id, "prov-1");
        assert_eq!(account.locale.as_deref(), Some("fr"));
        assert_eq!(account.zone_id.as_deref(), Some("Europe/Bratislava"));
        assert_eq!(
            account.business.and_then(|b| b.domicile).as_deref(),
            Some("SK")
        );
    }

    #[test]
    fn test_deserialize_minimal_account() {
        let json = r#"{"id": 7, "email": "b@y.org", "identityId": "prov-2"}"#;

        let account: RemoteAccount = serde_json::from_str(json).unwrap();
        assert!(account.locale.is_none());
        assert!(account.zone_id.is_none());
        assert!(account.business.is_none());
    }

    #[test]
    fn test_deserialize_rejects_invalid_email() {
        let json = r#"{"id": 7, "email": "nope", "identityId": "prov-2"}"#;
        assert!(serde_json::from_str::<RemoteAccount>(json).is_err());
    }
}
