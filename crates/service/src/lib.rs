//! Steward Link service library.
//!
//! Keeps a lightweight local copy of Account Steward accounts and exposes a
//! small REST API guarded by gateway authentication. The binary in
//! `main.rs` wires these modules together; keeping them in a library lets
//! them be tested and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod steward;
