//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post, put},
    Json, Router,
};
use filedepot_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    let public = public_routes();
    let protected = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        crate::auth::middleware::token_auth_middleware,
    ));

    // Uploads arrive base64-encoded, so the body cap leaves headroom over the
    // decoded size limit.
    let body_limit = config.max_upload_bytes.saturating_mul(2);

    let app = public
        .merge(protected)
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Routes that need no session token. GET /files/{id}/data does its own
/// owner check for private files.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::app::get_status))
        .route("/stats", get(handlers::app::get_stats))
        .route("/users", post(handlers::users::post_new))
        .route("/connect", get(handlers::sessions::get_connect))
        .route("/disconnect", get(handlers::sessions::get_disconnect))
        .route("/files/{id}/data", get(handlers::files::get_data))
}

/// Routes behind the X-Token middleware.
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(handlers::users::get_me))
        .route("/files", post(handlers::files::post_upload))
        .route("/files", get(handlers::files::get_index))
        .route("/files/{id}", get(handlers::files::get_show))
        .route("/files/{id}/publish", put(handlers::files::put_publish))
        .route("/files/{id}/unpublish", put(handlers::files::put_unpublish))
}
