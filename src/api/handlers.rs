use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{ScopeSet, MAX_PASSWORD_BYTES};
use crate::errors::AppError;
use crate::models::{is_valid_username, Account, NewAccount};
use crate::state::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Optional narrowing of the granted scopes. An empty list means no
    /// narrowing, same as omitting the field.
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub sub: String,
    pub scopes: ScopeSet,
    pub exp: i64,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        AppError::InvalidRequest
    })
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingAuthorization)?
        .to_str()
        .map_err(|_| AppError::InvalidTokenFormat)?;

    if raw.is_empty() {
        return Err(AppError::MissingAuthorization);
    }

    match raw.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::InvalidTokenFormat),
    }
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /token — exchange username/password for a bearer token
#[tracing::instrument(skip_all)]
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let req = parse_body(payload)?;

    let identity = state.verifier.verify(&req.username, req.password).await?;

    let scopes = match req.scopes.filter(|s| !s.is_empty()) {
        Some(requested) => {
            let requested =
                ScopeSet::from_scopes(requested).map_err(|_| AppError::InvalidRequest)?;
            if !requested.is_subset(&identity.scopes) {
                tracing::warn!(username = %identity.username, "login requested ungranted scope");
                return Err(AppError::ScopeNotGranted);
            }
            requested
        }
        None => identity.scopes,
    };

    let issued = state.tokens.issue(&identity.username, &scopes)?;
    tracing::info!(username = %identity.username, scopes = %scopes, "token issued");

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: issued.token_type.to_string(),
        expires_in: issued.expires_in,
    }))
}

/// POST /check — validate a bearer token and return its scopes
#[tracing::instrument(skip_all)]
pub async fn check_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CheckResponse>, AppError> {
    let token = bearer_token(&headers)?;
    let validated = state.tokens.validate(token)?;

    Ok(Json(CheckResponse {
        sub: validated.subject,
        scopes: validated.scopes,
        exp: validated.expires_at.timestamp(),
    }))
}

/// POST /users — register a new account
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let req = parse_body(payload)?;

    if !is_valid_username(&req.username)
        || req.password.is_empty()
        || req.password.len() > MAX_PASSWORD_BYTES
    {
        return Err(AppError::InvalidRequest);
    }
    let scopes = ScopeSet::from_scopes(req.scopes).map_err(|_| AppError::InvalidRequest)?;

    let password_hash = state.hasher.hash_blocking(req.password).await?;

    let account = state
        .store
        .insert(NewAccount {
            username: req.username,
            full_name: req.full_name.filter(|s| !s.is_empty()),
            email: req.email.filter(|s| !s.is_empty()),
            password_hash,
            disabled: req.disabled,
            scopes,
        })
        .await?;

    tracing::info!(username = %account.username, id = account.id, "account registered");
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /readyz — ready once the account store answers
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
