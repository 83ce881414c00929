use std::sync::Arc;

use super::{AuthError, PasswordHasher, ScopeSet};
use crate::store::AccountStore;

/// What to do when a disabled account presents correct credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisabledAccountPolicy {
    #[default]
    Reject,
    /// Let the login through; enforcement happens somewhere else.
    Allow,
}

/// A verified caller and the scopes granted to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub scopes: ScopeSet,
}

/// Proves a username/password pair against the account store.
///
/// Every client-side failure (unknown user, wrong password, disabled account)
/// is reported as [`AuthError::InvalidCredentials`]; the distinction is only
/// logged.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    disabled_policy: DisabledAccountPolicy,
}

impl CredentialVerifier {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        disabled_policy: DisabledAccountPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            disabled_policy,
        }
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn verify(&self, username: &str, password: String) -> Result<Identity, AuthError> {
        if username.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(account) = self.store.find_by_username(username).await? else {
            // Equalize timing with the mismatch path.
            self.hasher.verify_dummy_blocking(password).await;
            tracing::info!("login rejected: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = match self
            .hasher
            .verify_blocking(password, account.password_hash.clone())
            .await
        {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "stored password hash is unusable");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !matches {
            tracing::warn!("login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if account.disabled && self.disabled_policy == DisabledAccountPolicy::Reject {
            tracing::warn!("login rejected: account disabled");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Identity {
            username: account.username,
            scopes: account.scopes,
        })
    }
}
