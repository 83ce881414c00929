//! Credential verification and the bearer-token lifecycle.

pub mod error;
pub mod password;
pub mod scopes;
pub mod token;
pub mod verifier;

pub use error::AuthError;
pub use password::{PasswordHasher, MAX_PASSWORD_BYTES};
pub use scopes::ScopeSet;
pub use token::{Claims, IssuedToken, SigningSecret, TokenService, ValidatedToken};
pub use verifier::{CredentialVerifier, DisabledAccountPolicy, Identity};
