use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Kind of a stored file record. Folders carry no bytes; files and images have
/// a storage key pointing at the blob store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    File,
    Image,
}

impl FileKind {
    pub fn has_content(&self) -> bool {
        !matches!(self, FileKind::Folder)
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileKind::Folder => write!(f, "folder"),
            FileKind::File => write!(f, "file"),
            FileKind::Image => write!(f, "image"),
        }
    }
}

impl FromStr for FileKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(FileKind::Folder),
            "file" => Ok(FileKind::File),
            "image" => Ok(FileKind::Image),
            _ => Err(anyhow::anyhow!("Invalid file kind: {}", s)),
        }
    }
}

/// File metadata record. `parent_id = NULL` means root level; a non-null parent
/// must reference a folder record. Ownership (`user_id`) is immutable; only
/// `is_public` is ever updated after creation.
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub is_public: bool,
    pub parent_id: Option<Uuid>,
    /// Blob locator; present iff kind is file or image.
    pub storage_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public representation of a file record. The storage key is internal and
/// never exposed.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub is_public: bool,
    pub parent_id: Option<Uuid>,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        FileResponse {
            id: file.id,
            user_id: file.user_id,
            name: file.name,
            kind: file.kind,
            is_public: file.is_public,
            parent_id: file.parent_id,
        }
    }
}

/// Request DTO for POST /files. `data` is base64-encoded content, required for
/// anything but a folder. Fields are optional so missing ones can be reported
/// individually; `type` stays a raw string here so unknown values get the same
/// "Missing type" answer as an absent one instead of a serde rejection.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UploadRequest {
    #[validate(length(min = 1, message = "Missing name"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub is_public: bool,
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_round_trip() {
        for kind in [FileKind::Folder, FileKind::File, FileKind::Image] {
            assert_eq!(kind.to_string().parse::<FileKind>().unwrap(), kind);
        }
        assert!("directory".parse::<FileKind>().is_err());
    }

    #[test]
    fn test_upload_request_json_field_names() {
        let req: UploadRequest = serde_json::from_str(
            r#"{"name":"cat.png","type":"image","is_public":true,"data":"aGVsbG8="}"#,
        )
        .unwrap();
        assert_eq!(req.name.as_deref(), Some("cat.png"));
        assert_eq!(req.kind.as_deref(), Some("image"));
        assert!(req.is_public);
        assert!(req.parent_id.is_none());
    }

    #[test]
    fn test_upload_request_defaults() {
        let req: UploadRequest =
            serde_json::from_str(r#"{"name":"docs","type":"folder"}"#).unwrap();
        assert!(!req.is_public);
        assert!(req.data.is_none());
    }

    #[test]
    fn test_upload_request_keeps_unknown_type_for_handler_validation() {
        let req: UploadRequest =
            serde_json::from_str(r#"{"name":"x","type":"directory"}"#).unwrap();
        assert_eq!(req.kind.as_deref(), Some("directory"));
    }

    #[test]
    fn test_upload_request_folder_visibility_round_trips() {
        let req: UploadRequest =
            serde_json::from_str(r#"{"name":"shared","type":"folder","is_public":true}"#)
                .unwrap();
        assert_eq!(req.kind.as_deref(), Some("folder"));
        assert!(req.is_public);
    }

    #[test]
    fn test_upload_request_rejects_empty_name() {
        let req: UploadRequest =
            serde_json::from_str(r#"{"name":"","type":"file","data":"aGk="}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_file_response_uses_type_key_and_hides_storage_key() {
        let record = FileRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "cat.png".to_string(),
            kind: FileKind::Image,
            is_public: false,
            parent_id: None,
            storage_key: Some("deadbeef".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(FileResponse::from(record)).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["parent_id"], serde_json::Value::Null);
        assert!(json.get("storage_key").is_none());
    }
}
