//! File endpoints: upload, metadata reads, visibility, and content download.

use crate::auth::middleware::extract_token;
use crate::auth::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use filedepot_core::constants::THUMBNAIL_WIDTHS;
use filedepot_core::models::{FileKind, FileResponse, UploadRequest};
use filedepot_core::AppError;
use filedepot_storage::{derivative_key, StorageError};
use serde::Deserialize;
use validator::Validate;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Map the request's raw `type` value to a kind. Absent and unrecognized
/// values get the same answer as a missing field.
fn parse_kind(raw: Option<&str>) -> Result<FileKind, AppError> {
    raw.and_then(|value| value.parse::<FileKind>().ok())
        .ok_or_else(|| AppError::BadRequest("Missing type".to_string()))
}

#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    request_body = UploadRequest,
    responses(
        (status = 201, description = "File created", body = FileResponse),
        (status = 400, description = "Missing fields or invalid parent", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %current_user.user_id, operation = "upload_file")
)]
pub async fn post_upload(
    State(state): State<Arc<AppState>>,
    current_user: CurrentUser,
    ValidatedJson(request): ValidatedJson<UploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let name = request
        .name
        .ok_or_else(|| AppError::BadRequest("Missing name".to_string()))?;
    let kind = parse_kind(request.kind.as_deref())?;

    if kind == FileKind::Folder {
        let folder = state
            .files
            .create_folder(
                current_user.user_id,
                &name,
                request.parent_id,
                request.is_public,
            )
            .await?;
        return Ok((StatusCode::CREATED, Json(FileResponse::from(folder))));
    }

    let data = request
        .data
        .ok_or_else(|| AppError::BadRequest("Missing data".to_string()))?;

    if let Some(parent_id) = request.parent_id {
        state.files.validate_parent(parent_id).await?;
    }

    let content = STANDARD
        .decode(data.as_bytes())
        .map_err(|_| AppError::BadRequest("Invalid data".to_string()))?;

    if content.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest("File too large".to_string()).into());
    }

    let storage_key = state.storage.write(content).await?;

    let file = state
        .files
        .create_file(
            current_user.user_id,
            &name,
            kind,
            request.parent_id,
            request.is_public,
            &storage_key,
        )
        .await?;

    // Upload already succeeded; a failed enqueue only costs the thumbnails.
    if kind == FileKind::Image {
        if let Err(e) = state
            .thumbnail_queue
            .submit(file.id, current_user.user_id)
            .await
        {
            tracing::warn!(
                error = %e,
                file_id = %file.id,
                "Failed to enqueue thumbnail job for uploaded image"
            );
        }
    }

    Ok((StatusCode::CREATED, Json(FileResponse::from(file))))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Not owned or nonexistent", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %current_user.user_id, file_id = %id, operation = "get_file")
)]
pub async fn get_show(
    State(state): State<Arc<AppState>>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = state
        .files
        .get_owned(current_user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    Ok(Json(FileResponse::from(file)))
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ListQuery {
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub page: i64,
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of owned files", body = Vec<FileResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(
        user_id = %current_user.user_id,
        parent_id = ?query.parent_id,
        page = query.page,
        operation = "list_files"
    )
)]
pub async fn get_index(
    State(state): State<Arc<AppState>>,
    current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let files = state
        .files
        .list_page(current_user.user_id, query.parent_id, query.page)
        .await?;

    let response: Vec<FileResponse> = files.into_iter().map(FileResponse::from).collect();

    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/files/{id}/publish",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File is now public", body = FileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Not owned or nonexistent", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %current_user.user_id, file_id = %id, operation = "publish_file")
)]
pub async fn put_publish(
    State(state): State<Arc<AppState>>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    set_visibility(&state, current_user, id, true).await
}

#[utoipa::path(
    put,
    path = "/files/{id}/unpublish",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File is now private", body = FileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Not owned or nonexistent", body = ErrorResponse)
    ),
    security(("token" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %current_user.user_id, file_id = %id, operation = "unpublish_file")
)]
pub async fn put_unpublish(
    State(state): State<Arc<AppState>>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    set_visibility(&state, current_user, id, false).await
}

async fn set_visibility(
    state: &AppState,
    current_user: CurrentUser,
    id: Uuid,
    is_public: bool,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = state
        .files
        .set_visibility(current_user.user_id, id, is_public)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    Ok(Json(FileResponse::from(file)))
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct DataQuery {
    /// Thumbnail width; one of 500, 250, 100. Omit for the original.
    pub size: Option<u32>,
}

/// Check a requested thumbnail width against the generated set.
fn validate_size(size: u32) -> Result<u32, AppError> {
    if THUMBNAIL_WIDTHS.contains(&size) {
        Ok(size)
    } else {
        Err(AppError::BadRequest("Invalid size".to_string()))
    }
}

#[utoipa::path(
    get,
    path = "/files/{id}/data",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID"), DataQuery),
    responses(
        (status = 200, description = "Raw file content"),
        (status = 400, description = "Folder has no content or invalid size", body = ErrorResponse),
        (status = 404, description = "Not found or not visible", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, headers),
    fields(file_id = %id, size = ?query.size, operation = "get_file_data")
)]
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DataQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let not_found = || AppError::NotFound("Not found".to_string());

    let file = state.files.get(id).await?.ok_or_else(not_found)?;

    // Private content is served only to its owner; everyone else sees the
    // same 404 as for a nonexistent file.
    if !file.is_public {
        let requester = match extract_token(&headers) {
            Some(token) => state.sessions.resolve(token).await?,
            None => None,
        };
        if requester != Some(file.user_id) {
            return Err(not_found().into());
        }
    }

    if !file.kind.has_content() {
        return Err(AppError::BadRequest("A folder doesn't have content".to_string()).into());
    }

    let storage_key = file.storage_key.as_deref().ok_or_else(not_found)?;

    let key = match query.size {
        Some(size) => derivative_key(storage_key, validate_size(size)?),
        None => storage_key.to_string(),
    };

    let content = match state.storage.read(&key).await {
        Ok(content) => content,
        Err(StorageError::NotFound(_)) => {
            // A missing derivative usually means the job has not finished;
            // log its state for operators, the client just sees 404.
            if query.size.is_some() {
                if let Ok(Some(job)) = state.jobs.latest_for_file(file.id).await {
                    tracing::debug!(
                        file_id = %file.id,
                        job_status = %job.status,
                        "Requested derivative not generated"
                    );
                }
            }
            return Err(not_found().into());
        }
        Err(e) => return Err(e.into()),
    };

    let mime = mime_guess::from_path(&file.name).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.to_string())], content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_thumbnail_widths() {
        for width in THUMBNAIL_WIDTHS {
            assert_eq!(validate_size(width).unwrap(), width);
        }
    }

    #[test]
    fn rejects_other_widths() {
        for width in [0, 50, 101, 1000] {
            assert!(validate_size(width).is_err());
        }
    }

    #[test]
    fn parse_kind_accepts_known_values() {
        assert_eq!(parse_kind(Some("folder")).unwrap(), FileKind::Folder);
        assert_eq!(parse_kind(Some("file")).unwrap(), FileKind::File);
        assert_eq!(parse_kind(Some("image")).unwrap(), FileKind::Image);
    }

    #[test]
    fn parse_kind_reports_unknown_values_as_missing() {
        use filedepot_core::ErrorMetadata;

        for raw in [None, Some("directory"), Some("IMAGE"), Some("")] {
            let err = parse_kind(raw).unwrap_err();
            assert_eq!(err.client_message(), "Missing type");
            assert_eq!(err.http_status_code(), 400);
        }
    }

    #[test]
    fn query_params_are_traceable() {
        let list = ListQuery {
            parent_id: None,
            page: 2,
        };
        assert!(format!("{:?}", list).contains("page: 2"));

        let data = DataQuery { size: Some(100) };
        assert!(format!("{:?}", data).contains("100"));
    }
}
