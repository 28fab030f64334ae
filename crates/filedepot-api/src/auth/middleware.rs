//! Token authentication middleware.
//!
//! Protected routes require an `X-Token` header carrying a session token
//! issued by GET /connect. The middleware resolves the token to a user id and
//! attaches [`CurrentUser`] to the request; expired or unknown tokens get a
//! uniform 401.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use filedepot_core::{constants::TOKEN_HEADER, AppError};
use std::sync::Arc;

use crate::auth::models::CurrentUser;
use crate::error::HttpAppError;
use crate::state::AppState;

/// Pull the session token out of the request headers, if any.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok())
}

pub async fn token_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers()) {
        Some(token) => token.to_string(),
        None => {
            return HttpAppError(AppError::Unauthorized("Unauthorized".to_string()))
                .into_response();
        }
    };

    let user_id = match state.sessions.resolve(&token).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            tracing::debug!("Unknown or expired session token");
            return HttpAppError(AppError::Unauthorized("Unauthorized".to_string()))
                .into_response();
        }
        Err(e) => {
            return HttpAppError(e).into_response();
        }
    };

    request.extensions_mut().insert(CurrentUser { user_id });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn extract_token_reads_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(TOKEN_HEADER.as_bytes()).unwrap(),
            HeaderValue::from_static("abc-123"),
        );
        assert_eq!(extract_token(&headers), Some("abc-123"));
    }

    #[test]
    fn extract_token_missing_header() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
