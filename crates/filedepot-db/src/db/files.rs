use filedepot_core::constants::FILES_PAGE_SIZE;
use filedepot_core::{
    models::{FileKind, FileRecord},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const FILE_COLUMNS: &str =
    "id, user_id, name, kind, is_public, parent_id, storage_key, created_at, updated_at";

/// Row offset for a page number; negative pages clamp to the first page.
fn page_offset(page: i64) -> i64 {
    page.max(0) * FILES_PAGE_SIZE
}

/// Repository for file metadata: hierarchy, ownership, and visibility.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validate a prospective parent: it must exist and be a folder. Called
    /// before any side effect (blob write or insert) so failures leave no
    /// partial state behind.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn validate_parent(&self, parent_id: Uuid) -> Result<(), AppError> {
        let kind = sqlx::query_scalar::<Postgres, FileKind>(
            "SELECT kind FROM files WHERE id = $1",
        )
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await?;

        match kind {
            None => Err(AppError::InvalidParent("Parent not found".to_string())),
            Some(FileKind::Folder) => Ok(()),
            Some(_) => Err(AppError::InvalidParent(
                "Parent is not a folder".to_string(),
            )),
        }
    }

    /// Create a folder record. Folders carry no storage key but keep the
    /// requested visibility like any other record.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "insert"))]
    pub async fn create_folder(
        &self,
        user_id: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
        is_public: bool,
    ) -> Result<FileRecord, AppError> {
        if let Some(pid) = parent_id {
            self.validate_parent(pid).await?;
        }

        let file = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            INSERT INTO files (user_id, name, kind, is_public, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(name)
        .bind(FileKind::Folder)
        .bind(is_public)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(file_id = %file.id, user_id = %user_id, "Folder created");

        Ok(file)
    }

    /// Insert a content-bearing record (file or image). The blob must already
    /// be written; callers validate the parent first via `validate_parent`.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "insert"))]
    pub async fn create_file(
        &self,
        user_id: Uuid,
        name: &str,
        kind: FileKind,
        parent_id: Option<Uuid>,
        is_public: bool,
        storage_key: &str,
    ) -> Result<FileRecord, AppError> {
        let file = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            INSERT INTO files (user_id, name, kind, is_public, parent_id, storage_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(name)
        .bind(kind)
        .bind(is_public)
        .bind(parent_id)
        .bind(storage_key)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            file_id = %file.id,
            user_id = %user_id,
            kind = %kind,
            "File created"
        );

        Ok(file)
    }

    /// Fetch a record scoped to its owner. Nonexistence and foreign ownership
    /// both come back as `None`.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get_owned(&self, user_id: Uuid, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let file = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1 AND user_id = $2",
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// Fetch a record by id regardless of owner. Used by the content-read path,
    /// which applies its own visibility rules; and by the thumbnail worker via
    /// `get_owned`.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let file = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    /// List a page of the owner's files, optionally restricted to one parent.
    /// Ordered by (created_at, id) so page boundaries are deterministic.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn list_page(
        &self,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        page: i64,
    ) -> Result<Vec<FileRecord>, AppError> {
        let offset = page_offset(page);

        let files = match parent_id {
            Some(pid) => {
                sqlx::query_as::<Postgres, FileRecord>(&format!(
                    r#"
                    SELECT {FILE_COLUMNS} FROM files
                    WHERE user_id = $1 AND parent_id = $2
                    ORDER BY created_at, id
                    LIMIT $3 OFFSET $4
                    "#,
                ))
                .bind(user_id)
                .bind(pid)
                .bind(FILES_PAGE_SIZE)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<Postgres, FileRecord>(&format!(
                    r#"
                    SELECT {FILE_COLUMNS} FROM files
                    WHERE user_id = $1
                    ORDER BY created_at, id
                    LIMIT $2 OFFSET $3
                    "#,
                ))
                .bind(user_id)
                .bind(FILES_PAGE_SIZE)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(files)
    }

    /// Conditionally set visibility, scoped to (id, owner). A compare-and-set,
    /// not a lock: returns `None` when no matching row was updated, which
    /// covers both nonexistence and ownership mismatch.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    pub async fn set_visibility(
        &self,
        user_id: Uuid,
        id: Uuid,
        is_public: bool,
    ) -> Result<Option<FileRecord>, AppError> {
        let file = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            UPDATE files
            SET is_public = $3,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .bind(is_public)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref file) = file {
            tracing::debug!(file_id = %file.id, is_public, "File visibility updated");
        }

        Ok(file)
    }

    /// Total number of file records, for GET /stats.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "count"))]
    pub async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Liveness probe for GET /status.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset_steps_by_page_size() {
        assert_eq!(page_offset(0), 0);
        assert_eq!(page_offset(1), FILES_PAGE_SIZE);
        assert_eq!(page_offset(3), 3 * FILES_PAGE_SIZE);
    }

    #[test]
    fn test_page_offset_clamps_negative_pages() {
        assert_eq!(page_offset(-1), 0);
        assert_eq!(page_offset(i64::MIN), 0);
    }
}
