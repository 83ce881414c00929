//! Errors produced by credential verification and the token lifecycle.

use thiserror::Error;

use crate::store::StoreError;

/// Failures of the credential-and-token core.
///
/// Credential, token, scope and password-length failures are client faults;
/// the rest are server faults. Callers decide how much of the distinction
/// to surface. The HTTP layer collapses all client faults to generic messages.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user, wrong password or disabled account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Malformed, unsigned, wrongly signed or mis-shaped token.
    #[error("invalid token")]
    InvalidToken,

    /// Signature is valid but `exp` is not after the validation clock.
    /// Only `TokenService::validate_at` produces this.
    #[error("token expired")]
    TokenExpired,

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// bcrypt only reads the first 72 bytes, so longer passwords are refused.
    #[error("password longer than {0} bytes")]
    PasswordTooLong(usize),

    #[error("token issuance failed: {0}")]
    Issuance(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("account store error: {0}")]
    Store(#[from] StoreError),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        // `exp` is checked against the injected clock after decoding, never
        // by the library, so every decode failure is an invalid token.
        tracing::debug!(kind = ?err.kind(), "token decode failed");
        AuthError::InvalidToken
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AuthError::Hashing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(AuthError::TokenExpired.to_string(), "token expired");
        assert_eq!(
            AuthError::InvalidScope("empty scope".into()).to_string(),
            "invalid scope: empty scope"
        );
        assert_eq!(
            AuthError::PasswordTooLong(72).to_string(),
            "password longer than 72 bytes"
        );
    }

    #[test]
    fn test_error_from_jsonwebtoken() {
        let err: AuthError =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSignature)
                .into();
        assert!(matches!(err, AuthError::InvalidToken));

        let err: AuthError =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature)
                .into();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
