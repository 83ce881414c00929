use std::sync::Arc;

use crate::auth::{CredentialVerifier, PasswordHasher, TokenService};
use crate::config::Config;
use crate::store::AccountStore;

/// Shared application state passed to handlers.
///
/// Everything here is immutable after startup and safe to read concurrently.
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub verifier: CredentialVerifier,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, cfg: &Config) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(cfg.bcrypt_cost)?;
        let tokens = TokenService::new(&cfg.jwt_secret, cfg.token_ttl());
        Ok(Self::from_parts(store, hasher, tokens, cfg.disabled_policy))
    }

    pub fn from_parts(
        store: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
        disabled_policy: crate::auth::DisabledAccountPolicy,
    ) -> Self {
        let verifier = CredentialVerifier::new(store.clone(), hasher.clone(), disabled_policy);
        Self {
            store,
            verifier,
            tokens,
            hasher,
        }
    }
}
