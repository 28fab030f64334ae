//! User account endpoints.

use crate::auth::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use filedepot_core::models::{CreateUserRequest, UserResponse};
use filedepot_core::AppError;
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing or invalid credentials, or email taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "create_user"))]
pub async fn post_new(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = request
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("Missing email".to_string()))?;
    let password = request
        .password
        .clone()
        .ok_or_else(|| AppError::BadRequest("Missing password".to_string()))?;

    request.validate().map_err(AppError::from)?;

    // bcrypt is deliberately slow; keep it off the async executor.
    let password_hash = tokio::task::spawn_blocking(move || {
        bcrypt::hash(password.as_bytes(), bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let user = state.users.create(&email, &password_hash).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %current_user.user_id, operation = "get_me"))]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    current_user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .users
        .get_by_id(current_user.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}
