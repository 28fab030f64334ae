//! Session endpoints: sign in with Basic credentials, sign out with the token.

use crate::auth::credentials::parse_basic_auth;
use crate::auth::middleware::extract_token;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use filedepot_core::models::TokenResponse;
use filedepot_core::AppError;
use std::sync::Arc;

fn unauthorized() -> HttpAppError {
    HttpAppError(AppError::Unauthorized("Unauthorized".to_string()))
}

#[utoipa::path(
    get,
    path = "/connect",
    tag = "sessions",
    responses(
        (status = 200, description = "Session token issued", body = TokenResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse)
    ),
    security(("basic" = []))
)]
#[tracing::instrument(skip(state, headers), fields(operation = "connect"))]
pub async fn get_connect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let credentials = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth)
        .ok_or_else(unauthorized)?;

    let user = state
        .users
        .get_by_email(&credentials.email)
        .await?
        .ok_or_else(unauthorized)?;

    let password = credentials.password;
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password.as_bytes(), &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

    if !verified {
        return Err(unauthorized());
    }

    let session = state.sessions.create(user.id).await?;

    tracing::info!(user_id = %user.id, "Session opened");

    Ok(Json(TokenResponse {
        token: session.token,
    }))
}

#[utoipa::path(
    get,
    path = "/disconnect",
    tag = "sessions",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[tracing::instrument(skip(state, headers), fields(operation = "disconnect"))]
pub async fn get_disconnect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = extract_token(&headers).ok_or_else(unauthorized)?;

    if !state.sessions.revoke(token).await? {
        return Err(unauthorized());
    }

    Ok(StatusCode::NO_CONTENT)
}
