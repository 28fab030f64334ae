//! Authenticated-request context.
//!
//! The token middleware resolves `X-Token` to a user and stores
//! [`CurrentUser`] as a request extension; handlers extract it as an argument.

use axum::{extract::FromRequestParts, http::request::Parts};
use filedepot_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;

/// Identity attached to a request after token resolution.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Unauthorized".to_string())))
    }
}
