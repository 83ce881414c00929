//! Bearer token issuance and validation.
//!
//! Tokens are compact HS256 JWS strings over a fixed [`Claims`] struct. The
//! signature covers subject, scopes and expiry, so any mutation invalidates
//! the token. Tokens are never stored server-side; they expire by elapsed
//! time alone.
//!
//! Validation is a linear pipeline:
//! 1. decode the structure and verify the signature (HS256 only)
//! 2. compare `exp` against the clock (the only expiry check)
//! 3. decode the `scopes` claim back into a [`ScopeSet`]

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{AuthError, ScopeSet};

pub const TOKEN_TYPE: &str = "bearer";

/// Default token lifetime.
pub const DEFAULT_TTL_MINUTES: i64 = 120;

/// Longest configurable token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Process-wide HMAC secret. Zeroized on drop, never printed.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    /// Minimum accepted secret length in bytes.
    pub const MIN_LEN: usize = 32;

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated username.
    pub sub: String,
    /// Granted scopes in [`ScopeSet::encode`] form.
    pub scopes: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
}

/// A freshly minted token, ready for the login response.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// The authorization context recovered from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    pub subject: String,
    pub scopes: ScopeSet,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked once, against the caller's clock, in `validate_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, username: &str, scopes: &ScopeSet) -> Result<IssuedToken, AuthError> {
        self.issue_at(username, scopes, Utc::now())
    }

    pub fn issue_at(
        &self,
        username: &str,
        scopes: &ScopeSet,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        if username.is_empty() {
            return Err(AuthError::Issuance("empty subject".into()));
        }

        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Issuance("expiry out of range".into()))?;
        let claims = Claims {
            sub: username.to_string(),
            scopes: scopes.encode(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Issuance(e.to_string()))?;

        tracing::debug!(sub = %claims.sub, exp = claims.exp, "issued token");

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE,
            expires_in: self.ttl.num_seconds(),
            expires_at,
        })
    }

    pub fn validate(&self, token: &str) -> Result<ValidatedToken, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<ValidatedToken, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token failed verification");
                AuthError::from(e)
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        if now.timestamp() >= claims.exp {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, "token expired");
            return Err(AuthError::TokenExpired);
        }

        let scopes = ScopeSet::decode(&claims.scopes).map_err(|_| AuthError::InvalidToken)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::InvalidToken)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(ValidatedToken {
            subject: claims.sub,
            scopes,
            issued_at,
            expires_at,
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::json;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef-test-only";

    fn service() -> TokenService {
        TokenService::new(&SigningSecret::new(SECRET), Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    fn scopes(list: &[&str]) -> ScopeSet {
        ScopeSet::from_scopes(list.iter().copied()).unwrap()
    }

    fn sign_raw(claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let svc = service();
        let granted = scopes(&["read", "write"]);
        let issued = svc.issue("alice", &granted).unwrap();

        assert_eq!(issued.token_type, "bearer");
        assert_eq!(issued.expires_in, 7200);

        let validated = svc.validate(&issued.access_token).unwrap();
        assert_eq!(validated.subject, "alice");
        assert_eq!(validated.scopes, granted);
    }

    #[test]
    fn test_round_trip_empty_scopes() {
        let svc = service();
        let issued = svc.issue("bob", &ScopeSet::new()).unwrap();
        let validated = svc.validate(&issued.access_token).unwrap();
        assert!(validated.scopes.is_empty());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let svc = service();
        let issued = svc.issue("alice", &scopes(&["read"])).unwrap();
        let first = svc.validate(&issued.access_token).unwrap();
        let second = svc.validate(&issued.access_token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_expiry_boundary() {
        let svc = service();
        let now = Utc::now();
        let issued = svc.issue_at("alice", &scopes(&["read"]), now).unwrap();

        let ok = svc.validate_at(&issued.access_token, now + Duration::minutes(119));
        assert!(ok.is_ok());

        let expired = svc.validate_at(&issued.access_token, now + Duration::minutes(121));
        assert!(matches!(expired, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_expired_at_exact_expiry_instant() {
        let svc = service();
        let now = Utc::now();
        let issued = svc.issue_at("alice", &ScopeSet::new(), now).unwrap();
        let result = svc.validate_at(&issued.access_token, issued.expires_at);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_expired_token_with_valid_signature() {
        let svc = service();
        let past = Utc::now() - Duration::hours(3);
        let issued = svc.issue_at("alice", &ScopeSet::new(), past).unwrap();
        assert!(matches!(
            svc.validate(&issued.access_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let svc = service();
        let issued = svc.issue("alice", &scopes(&["read", "write"])).unwrap();
        let token = issued.access_token;
        let sig_start = token.rfind('.').unwrap() + 1;

        for i in sig_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'g' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(
                matches!(svc.validate(&tampered), Err(AuthError::InvalidToken)),
                "tampering at byte {} was not detected",
                i
            );
        }
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let svc = service();
        let issued = svc.issue("alice", &scopes(&["read"])).unwrap();
        let parts: Vec<&str> = issued.access_token.split('.').collect();

        let now = Utc::now().timestamp();
        let forged = URL_SAFE_NO_PAD.encode(
            json!({"sub": "alice", "scopes": "admin,read", "iat": now, "exp": now + 3600})
                .to_string(),
        );
        let token = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert!(matches!(svc.validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = TokenService::new(
            &SigningSecret::new(b"another-secret-another-secret-another".to_vec()),
            Duration::minutes(DEFAULT_TTL_MINUTES),
        );
        let issued = other.issue("alice", &ScopeSet::new()).unwrap();
        assert!(matches!(
            service().validate(&issued.access_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_alg_none_rejected() {
        let now = Utc::now().timestamp();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({"sub": "alice", "scopes": "read", "iat": now, "exp": now + 3600}).to_string(),
        );
        let token = format!("{}.{}.", header, payload);
        assert!(matches!(service().validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let svc = service();
        for token in ["", "not-a-jwt", "a.b", "a.b.c", "...."] {
            assert!(
                matches!(svc.validate(token), Err(AuthError::InvalidToken)),
                "accepted malformed token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_scopes_claim_of_wrong_shape_rejected() {
        let now = Utc::now().timestamp();
        let token = sign_raw(&json!({
            "sub": "alice",
            "scopes": ["read", "write"],
            "iat": now,
            "exp": now + 3600,
        }));
        assert!(matches!(service().validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_undecodable_scopes_claim_rejected() {
        let now = Utc::now().timestamp();
        let token = sign_raw(&json!({
            "sub": "alice",
            "scopes": "read,,write",
            "iat": now,
            "exp": now + 3600,
        }));
        assert!(matches!(service().validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_missing_claims_rejected() {
        let now = Utc::now().timestamp();
        let no_exp = sign_raw(&json!({"sub": "alice", "scopes": "", "iat": now}));
        let no_sub = sign_raw(&json!({"scopes": "", "iat": now, "exp": now + 3600}));
        let empty_sub = sign_raw(&json!({"sub": "", "scopes": "", "iat": now, "exp": now + 3600}));

        let svc = service();
        assert!(matches!(svc.validate(&no_exp), Err(AuthError::InvalidToken)));
        assert!(matches!(svc.validate(&no_sub), Err(AuthError::InvalidToken)));
        assert!(matches!(svc.validate(&empty_sub), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_empty_subject_not_issued() {
        assert!(matches!(
            service().issue("", &ScopeSet::new()),
            Err(AuthError::Issuance(_))
        ));
    }

    #[test]
    fn test_out_of_range_expiry_not_issued() {
        let svc = TokenService::new(
            &SigningSecret::new(SECRET),
            Duration::seconds(i64::MAX / 1000),
        );
        assert!(matches!(
            svc.issue("alice", &ScopeSet::new()),
            Err(AuthError::Issuance(_))
        ));
    }

    #[test]
    fn test_max_ttl_issues() {
        let svc = TokenService::new(
            &SigningSecret::new(SECRET),
            Duration::minutes(MAX_TTL_MINUTES),
        );
        let issued = svc.issue("alice", &ScopeSet::new()).unwrap();
        assert_eq!(issued.expires_in, MAX_TTL_MINUTES * 60);
        assert!(svc.validate(&issued.access_token).is_ok());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SigningSecret::new(SECRET);
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("0123456789"));
    }
}
