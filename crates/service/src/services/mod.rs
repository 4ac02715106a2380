//! Business logic services.
//!
//! # Services
//!
//! - `local_account` - Get-or-create of local accounts from the Account Steward
//! - `gate` - Resolution of the caller's local account for request handlers

pub mod gate;
pub mod local_account;

pub use gate::RequestGate;
pub use local_account::{AccountError, LocalAccountProvider};
