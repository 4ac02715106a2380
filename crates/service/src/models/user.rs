//! The authenticated caller, as asserted by the API gateway.

use serde::{Deserialize, Serialize};
use steward_link_core::Email;

/// User authenticated by the identity provider in front of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Identity provider's ID of the user.
    pub id: String,
    /// Login email.
    pub email: Email,
    /// Token issuer, if the gateway forwards it.
    #[serde(default)]
    pub issuer: Option<String>,
}
