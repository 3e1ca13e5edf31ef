//! Authentication endpoints and middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::Utc;

use crate::error::{ApiError, Result};
use crate::models::{CredentialsRequest, LoginResponse, RegisterResponse, UserInfo};
use crate::services::auth::{generate_token, hash_password, hash_token, verify_password};
use crate::AppState;

/// Authenticated user info stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub token_hash: String,
}

/// Auth middleware - resolves the bearer token to a user
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| ApiError::Unauthorized("Token malformatted".to_string()))?;
    let token_hash = hash_token(token);

    let user = state
        .db
        .get_user_by_session(&token_hash, Utc::now())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Token invalid".to_string()))?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        token_hash,
    });

    Ok(next.run(request).await)
}

/// Extract the token from a `Bearer <token>` header; the scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let email = payload.validate()?;

    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    // The pre-check can race with a concurrent registration.
    let user = state
        .db
        .create_user(&email, &password_hash)
        .await?
        .ok_or_else(|| ApiError::Conflict("Email is already registered".to_string()))?;

    tracing::info!("Registered new user: {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration successful".to_string(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let email = payload.validate()?;
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state.db.get_user_by_email(&email).await?.ok_or_else(invalid)?;

    let password = payload.password;
    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        return Err(invalid());
    }

    let now = Utc::now();
    let token = generate_token();
    let expires_at = now + state.config.session_ttl;
    state
        .db
        .create_session(user.id, &hash_token(&token), expires_at)
        .await?;

    let purged = state.db.delete_expired_sessions(user.id, now).await?;
    if purged > 0 {
        tracing::debug!("Purged {} expired sessions for user {}", purged, user.id);
    }

    tracing::info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        success: true,
        token,
        expires_at,
        user: user.to_api_user(),
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>> {
    let revoked = state.db.delete_session(&auth.token_hash).await?;
    Ok(Json(serde_json::json!({ "success": revoked })))
}

/// GET /api/auth/me
pub async fn me(Extension(auth): Extension<AuthenticatedUser>) -> Json<UserInfo> {
    Json(UserInfo {
        id: auth.user_id,
        email: auth.email,
    })
}
