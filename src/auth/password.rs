//! Salted, adaptive password hashing (bcrypt).
//!
//! bcrypt hashes embed their salt and cost, so verification needs nothing but
//! the stored string. Both operations are deliberately slow and run on the
//! blocking thread pool when called from async code.

use super::AuthError;

/// bcrypt ignores everything past this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Input for the dummy hash compared against when an account does not exist.
const TIMING_EQUALIZER: &str = "scopeauth-timing-equalizer";

#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Build a hasher with the given bcrypt cost (4..=31).
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        let dummy_hash = bcrypt::hash(TIMING_EQUALIZER, cost)?;
        Ok(Self { cost, dummy_hash })
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Passwords over [`MAX_PASSWORD_BYTES`] are refused rather than silently
    /// truncated.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::PasswordTooLong(MAX_PASSWORD_BYTES));
        }
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Constant-time comparison of `password` against a stored hash.
    ///
    /// A password too long to have been hashed never matches, so a shared
    /// 72-byte prefix is not enough to log in.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            // Same bcrypt work as a real check, so timing stays uniform.
            bcrypt::verify(&password.as_bytes()[..MAX_PASSWORD_BYTES], hash)?;
            return Ok(false);
        }
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Burn the same CPU as a real verification, discarding the result.
    pub fn verify_dummy(&self, password: &str) {
        let _ = bcrypt::verify(password, &self.dummy_hash);
    }

    pub async fn hash_blocking(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("hashing task failed: {}", e)))?
    }

    pub async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(format!("verification task failed: {}", e)))?
    }

    pub async fn verify_dummy_blocking(&self, password: String) {
        let hasher = self.clone();
        let _ = tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await;
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}
