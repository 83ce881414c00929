//! In-memory account store.
//!
//! Cheaply cloneable; all clones share the same map. Data is lost when the
//! process exits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AccountStore, StoreError};
use crate::models::{Account, NewAccount};

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.accounts.len()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(username).cloned())
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.accounts.contains_key(&account.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already registered",
                account.username
            )));
        }
        if let Some(email) = account.email.as_deref() {
            if inner
                .accounts
                .values()
                .any(|a| a.email.as_deref() == Some(email))
            {
                return Err(StoreError::Conflict("email already registered".into()));
            }
        }

        inner.next_id += 1;
        let stored = Account {
            id: inner.next_id,
            username: account.username,
            full_name: account.full_name,
            email: account.email,
            password_hash: account.password_hash,
            disabled: account.disabled,
            scopes: account.scopes,
            created_at: Utc::now(),
        };
        inner
            .accounts
            .insert(stored.username.clone(), stored.clone());
        Ok(stored)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
