//! Durable keyed storage for account records.
//!
//! The credential core only reads through [`AccountStore`]; registration is the
//! sole writer. Two backends are provided: [`postgres::PgStore`] for the
//! service and [`memory::MemoryStore`] for tests and local tooling.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, NewAccount};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Username or email is already registered.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped to an [`Account`].
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exact-match lookup by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Insert a new account, returning it with its store-assigned id.
    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Cheap liveness probe used by the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
