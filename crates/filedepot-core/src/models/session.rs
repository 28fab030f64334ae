use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Authenticated session: an opaque token mapped to a user with a fixed
/// expiry. Multiple concurrent sessions per user are permitted; expiry is
/// store-enforced (resolution filters on `expires_at`).
#[derive(Debug, Clone, FromRow)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Response body for GET /connect.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}
