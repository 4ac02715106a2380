//! Domain models owned by the service.

pub mod local_account;
pub mod user;

pub use local_account::{
    DEFAULT_ZONE, InitError, LocalAccount, LocalAccountBuilder, LocalAccountError,
};
pub use user::AuthenticatedUser;
