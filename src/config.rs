use anyhow::Context;

use crate::auth::token::{DEFAULT_TTL_MINUTES, MAX_TTL_MINUTES};
use crate::auth::{DisabledAccountPolicy, SigningSecret};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// HS256 signing secret. Set via SCOPEAUTH_JWT_SECRET; at least 32 bytes.
    pub jwt_secret: SigningSecret,
    /// Token lifetime in minutes, 1..=525600 (one year). Default: 120.
    pub token_ttl_minutes: i64,
    /// bcrypt cost used for new hashes. Default: 12.
    pub bcrypt_cost: u32,
    pub disabled_policy: DisabledAccountPolicy,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Config {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable source.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = lookup("SCOPEAUTH_JWT_SECRET")
        .filter(|s| !s.is_empty())
        .context("SCOPEAUTH_JWT_SECRET must be set (generate one with `scopeauth keygen`)")?;
    if secret.len() < SigningSecret::MIN_LEN {
        anyhow::bail!(
            "SCOPEAUTH_JWT_SECRET is too short: need at least {} bytes, got {}",
            SigningSecret::MIN_LEN,
            secret.len()
        );
    }

    let token_ttl_minutes = parse_or(&lookup, "SCOPEAUTH_TOKEN_TTL_MINUTES", DEFAULT_TTL_MINUTES)?;
    if !(1..=MAX_TTL_MINUTES).contains(&token_ttl_minutes) {
        anyhow::bail!(
            "SCOPEAUTH_TOKEN_TTL_MINUTES must be between 1 and {}",
            MAX_TTL_MINUTES
        );
    }

    let bcrypt_cost = parse_or(&lookup, "SCOPEAUTH_BCRYPT_COST", bcrypt::DEFAULT_COST)?;
    if !(4..=31).contains(&bcrypt_cost) {
        anyhow::bail!("SCOPEAUTH_BCRYPT_COST must be between 4 and 31");
    }

    let disabled_policy = if parse_or(&lookup, "SCOPEAUTH_REJECT_DISABLED", true)? {
        DisabledAccountPolicy::Reject
    } else {
        DisabledAccountPolicy::Allow
    };

    Ok(Config {
        port: parse_or(&lookup, "SCOPEAUTH_PORT", 8000)?,
        database_url: lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/scopeauth".into()),
        jwt_secret: SigningSecret::new(secret.into_bytes()),
        token_ttl_minutes,
        bcrypt_cost,
        disabled_policy,
        pool: PoolConfig {
            max_connections: parse_or(&lookup, "SCOPEAUTH_DB_MAX_CONNECTIONS", 30)?,
            min_connections: parse_or(&lookup, "SCOPEAUTH_DB_MIN_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse_or(&lookup, "SCOPEAUTH_DB_ACQUIRE_TIMEOUT_SECS", 60)?,
        },
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", key, raw, e)),
        _ => Ok(default),
    }
}
