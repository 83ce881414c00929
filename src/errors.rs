use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request")]
    InvalidRequest,

    #[error("authorization header missing")]
    MissingAuthorization,

    #[error("authorization header is not a bearer token")]
    InvalidTokenFormat,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("requested scope not granted")]
    ScopeNotGranted,

    #[error("username already registered")]
    UsernameTaken,

    #[error("token issuance failed: {0}")]
    Issuance(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::InvalidToken => AppError::InvalidToken,
            AuthError::TokenExpired => AppError::TokenExpired,
            AuthError::InvalidScope(_) | AuthError::PasswordTooLong(_) => {
                AppError::InvalidRequest
            }
            AuthError::Issuance(e) => AppError::Issuance(e),
            AuthError::Store(StoreError::Conflict(_)) => AppError::UsernameTaken,
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request"),
            AppError::MissingAuthorization => {
                (StatusCode::UNAUTHORIZED, "Authorization header is required")
            }
            AppError::InvalidTokenFormat => (StatusCode::UNAUTHORIZED, "Invalid token format"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            // Expired and invalid tokens share one message.
            AppError::InvalidToken | AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token")
            }
            AppError::ScopeNotGranted => (StatusCode::BAD_REQUEST, "Requested scope not granted"),
            AppError::UsernameTaken => (StatusCode::BAD_REQUEST, "Username already registered"),
            AppError::Issuance(e) => {
                tracing::error!("Token issuance error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Could not generate token")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let mut response = (status, Json(json!({ "error": msg }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_authorization_response() {
        let resp = AppError::MissingAuthorization.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(
            body_json(resp).await,
            json!({"error": "Authorization header is required"})
        );
    }

    #[tokio::test]
    async fn test_expired_and_invalid_share_message() {
        let expired = body_json(AppError::TokenExpired.into_response()).await;
        let invalid = body_json(AppError::InvalidToken.into_response()).await;
        assert_eq!(expired, invalid);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let resp = AppError::Internal(anyhow::anyhow!("relation \"users\" does not exist"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_none());
        assert_eq!(body_json(resp).await, json!({"error": "Internal server error"}));
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from(AuthError::Store(StoreError::Conflict("dup".into()))),
            AppError::UsernameTaken
        ));
        assert!(matches!(
            AppError::from(AuthError::PasswordTooLong(72)),
            AppError::InvalidRequest
        ));
        assert!(matches!(
            AppError::from(AuthError::Hashing("boom".into())),
            AppError::Internal(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::Unavailable("down".into())),
            AppError::Internal(_)
        ));
    }
}
