//! scopeauth — library crate for the binary and integration tests.
//!
//! Password login against stored bcrypt hashes, HS256 bearer tokens carrying
//! the caller's scopes, and the axum router exposing both.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod state;
pub mod store;
