//! Core types for Steward Link.
//!
//! This module provides type-safe wrappers for the account domain.

pub mod domicile;
pub mod email;
pub mod id;
pub mod language;

pub use domicile::{Domicile, DomicileError};
pub use email::{Email, EmailError};
pub use id::*;
pub use language::{LanguageTag, LanguageTagError};
