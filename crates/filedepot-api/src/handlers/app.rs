//! Service status and stats endpoints.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    /// Session store reachable
    pub cache: bool,
    /// Metadata store reachable
    pub db: bool,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub users: i64,
    pub files: i64,
}

#[utoipa::path(
    get,
    path = "/status",
    tag = "app",
    responses(
        (status = 200, description = "Backend component health", body = StatusResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_status"))]
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db = matches!(
        tokio::time::timeout(CHECK_TIMEOUT, state.files.ping()).await,
        Ok(Ok(()))
    );
    let cache = matches!(
        tokio::time::timeout(CHECK_TIMEOUT, state.sessions.ping()).await,
        Ok(Ok(()))
    );

    if !db || !cache {
        tracing::warn!(db, cache, "Status check found an unhealthy component");
    }

    Json(StatusResponse { cache, db })
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "app",
    responses(
        (status = 200, description = "Totals of stored users and files", body = StatsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_stats"))]
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let users = state.users.count().await?;
    let files = state.files.count().await?;

    Ok(Json(StatsResponse { users, files }))
}
