//! OpenAPI documentation.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use filedepot_core::models;

/// Registers the two authentication schemes: Basic credentials for /connect
/// and the X-Token session header everywhere else.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Token"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Filedepot API",
        version = "0.1.0",
        description = "File storage API with token sessions, folder hierarchy, per-file visibility, and background thumbnail generation for images."
    ),
    paths(
        // App
        handlers::app::get_status,
        handlers::app::get_stats,
        // Users
        handlers::users::post_new,
        handlers::users::get_me,
        // Sessions
        handlers::sessions::get_connect,
        handlers::sessions::get_disconnect,
        // Files
        handlers::files::post_upload,
        handlers::files::get_show,
        handlers::files::get_index,
        handlers::files::put_publish,
        handlers::files::put_unpublish,
        handlers::files::get_data,
    ),
    components(
        schemas(
            models::FileKind,
            models::FileResponse,
            models::UploadRequest,
            models::CreateUserRequest,
            models::UserResponse,
            models::TokenResponse,
            handlers::app::StatusResponse,
            handlers::app::StatsResponse,
            handlers::files::ListQuery,
            handlers::files::DataQuery,
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "app", description = "Service health and statistics"),
        (name = "users", description = "Account registration and identity"),
        (name = "sessions", description = "Token-based session management"),
        (name = "files", description = "File upload, listing, visibility, and content download")
    )
)]
pub struct ApiDoc;
