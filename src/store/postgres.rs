use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{AccountStore, StoreError};
use crate::auth::ScopeSet;
use crate::config::PoolConfig;
use crate::models::{Account, NewAccount};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, opts: &PoolConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .min_connections(opts.min_connections)
            .acquire_timeout(Duration::from_secs(opts.acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(30 * 60))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, username, full_name, email, password_hash, disabled, scopes, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"INSERT INTO users (username, full_name, email, password_hash, disabled, scopes)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, username, full_name, email, password_hash, disabled, scopes, created_at"#,
        )
        .bind(&account.username)
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.disabled)
        .bind(account.scopes.encode())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Database(other),
        })?;

        Account::try_from(row)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub disabled: bool,
    pub scopes: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let scopes = ScopeSet::decode(&row.scopes).map_err(|e| {
            StoreError::Corrupt(format!("user {}: {}", row.id, e))
        })?;
        Ok(Account {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            disabled: row.disabled,
            scopes,
            created_at: row.created_at,
        })
    }
}
