//! Steward Link Core - Shared domain types.
//!
//! This crate provides the types used across all Steward Link components:
//! - `service` - Account link HTTP service and local account cache
//! - `cli` - Command-line tools for migrations and local account management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Account IDs, emails, domiciles, and language tags

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
