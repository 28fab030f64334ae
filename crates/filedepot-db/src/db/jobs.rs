use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use filedepot_core::models::ThumbnailJob;

/// Channel name for PostgreSQL LISTEN/NOTIFY when a new thumbnail job is
/// enqueued.
pub const THUMBNAIL_JOB_NOTIFY_CHANNEL: &str = "filedepot_new_thumbnail_job";

const JOB_COLUMNS: &str = "id, file_id, user_id, status, error, retry_count, max_retries, \
     created_at, scheduled_at, started_at, completed_at, updated_at";

/// Repository backing the thumbnail work queue.
#[derive(Clone)]
pub struct ThumbnailJobRepository {
    pool: PgPool,
}

impl ThumbnailJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a job for an uploaded image.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        max_retries: i32,
    ) -> Result<ThumbnailJob> {
        // Insert and notify in one transaction so workers cannot observe the
        // notification before the row is visible.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for job creation")?;

        let job: ThumbnailJob = sqlx::query_as::<Postgres, ThumbnailJob>(&format!(
            r#"
            INSERT INTO thumbnail_jobs (file_id, user_id, status, max_retries)
            VALUES ($1, $2, 'pending', $3)
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(file_id)
        .bind(user_id)
        .bind(max_retries)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert thumbnail job")?;

        // Non-fatal: workers discover jobs via polling if NOTIFY fails.
        if let Err(e) = sqlx::query("SELECT pg_notify($1, '')")
            .bind(THUMBNAIL_JOB_NOTIFY_CHANNEL)
            .execute(&mut *tx)
            .await
        {
            tracing::warn!(
                error = %e,
                job_id = %job.id,
                "Failed to send pg_notify for new job, workers will discover it via polling"
            );
        }

        tx.commit()
            .await
            .context("Failed to commit job creation transaction")?;

        tracing::info!(job_id = %job.id, file_id = %file_id, "Thumbnail job enqueued");

        Ok(job)
    }

    /// Atomically claim the next due pending job and mark it running. Uses
    /// FOR UPDATE SKIP LOCKED so concurrent workers never claim the same job;
    /// rows with a future `scheduled_at` (retry backoff) are left alone.
    #[tracing::instrument(skip(self))]
    pub async fn claim_next(&self) -> Result<Option<ThumbnailJob>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let job: Option<ThumbnailJob> = sqlx::query_as::<Postgres, ThumbnailJob>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM thumbnail_jobs
            WHERE status = 'pending' AND scheduled_at <= now()
            ORDER BY scheduled_at
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        ))
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch next job")?;

        if let Some(job) = job {
            let claimed: ThumbnailJob = sqlx::query_as::<Postgres, ThumbnailJob>(&format!(
                r#"
                UPDATE thumbnail_jobs
                SET status = 'running',
                    started_at = now(),
                    updated_at = now()
                WHERE id = $1
                RETURNING {JOB_COLUMNS}
                "#,
            ))
            .bind(job.id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to mark job running")?;

            tx.commit().await.context("Failed to commit claim")?;

            tracing::debug!(job_id = %claimed.id, file_id = %claimed.file_id, "Job claimed");

            Ok(Some(claimed))
        } else {
            tx.rollback().await.ok();
            Ok(None)
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_completed(&self, job_id: Uuid) -> Result<ThumbnailJob> {
        let job: ThumbnailJob = sqlx::query_as::<Postgres, ThumbnailJob>(&format!(
            r#"
            UPDATE thumbnail_jobs
            SET status = 'completed',
                completed_at = now(),
                updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark job completed")?;

        tracing::info!(job_id = %job_id, file_id = %job.file_id, "Thumbnail job completed");

        Ok(job)
    }

    #[tracing::instrument(skip(self, error))]
    pub async fn mark_failed(&self, job_id: Uuid, error: serde_json::Value) -> Result<ThumbnailJob> {
        let job: ThumbnailJob = sqlx::query_as::<Postgres, ThumbnailJob>(&format!(
            r#"
            UPDATE thumbnail_jobs
            SET status = 'failed',
                error = $2,
                completed_at = now(),
                updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .bind(error)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark job failed")?;

        tracing::error!(
            job_id = %job_id,
            file_id = %job.file_id,
            retry_count = job.retry_count,
            "Thumbnail job failed"
        );

        Ok(job)
    }

    /// Increment the retry counter and requeue the job as pending, due again
    /// after `delay_seconds`. The claim query skips it until then, so the
    /// worker that failed it is free to pick up other jobs immediately.
    #[tracing::instrument(skip(self))]
    pub async fn increment_retry(&self, job_id: Uuid, delay_seconds: u64) -> Result<ThumbnailJob> {
        let job: ThumbnailJob = sqlx::query_as::<Postgres, ThumbnailJob>(&format!(
            r#"
            UPDATE thumbnail_jobs
            SET status = 'pending',
                retry_count = retry_count + 1,
                scheduled_at = now() + make_interval(secs => $2),
                started_at = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .bind(delay_seconds as f64)
        .fetch_one(&self.pool)
        .await
        .context("Failed to increment retry count")?;

        tracing::info!(
            job_id = %job_id,
            retry_count = job.retry_count,
            max_retries = job.max_retries,
            delay_seconds,
            "Thumbnail job retry scheduled"
        );

        Ok(job)
    }

    /// Most recent job for a file, any status. Lets callers distinguish
    /// "pending", "failed", and "done" instead of probing the blob store.
    #[tracing::instrument(skip(self))]
    pub async fn latest_for_file(&self, file_id: Uuid) -> Result<Option<ThumbnailJob>> {
        let job: Option<ThumbnailJob> = sqlx::query_as::<Postgres, ThumbnailJob>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM thumbnail_jobs
            WHERE file_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch job for file")?;

        Ok(job)
    }
}
