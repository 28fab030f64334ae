//! Thumbnail queue: worker pool, LISTEN/NOTIFY or polling, retry, and submission.
//!
//! Shutdown: [`ThumbnailQueue::shutdown`] signals the pool to stop; it does not
//! wait for in-flight jobs. For graceful shutdown, coordinate with your runtime
//! and allow time for running jobs to finish before process exit.

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;
use uuid::Uuid;

use filedepot_core::models::ThumbnailJob;
use filedepot_db::{ThumbnailJobRepository, THUMBNAIL_JOB_NOTIFY_CHANNEL};

use crate::handler::ThumbnailHandler;

/// Maximum delay in seconds before retrying a failed job. Caps exponential
/// backoff so that high retry counts do not produce excessively long delays.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Computes backoff in seconds for a given retry count (exponential with cap).
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: i32) -> u64 {
    (2_u64.pow(retry_count as u32)).min(MAX_RETRY_BACKOFF_SECS)
}

/// Backoff before the next attempt of a failed job, or `None` when its
/// retry budget is spent.
fn requeue_delay(job: &ThumbnailJob) -> Option<u64> {
    job.can_retry()
        .then(|| compute_retry_backoff_seconds(job.retry_count))
}

#[derive(Clone)]
pub struct ThumbnailQueueConfig {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub max_retries: i32,
}

impl Default for ThumbnailQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            poll_interval_ms: 1000,
            max_retries: 3,
        }
    }
}

pub struct ThumbnailQueue {
    repository: ThumbnailJobRepository,
    config: ThumbnailQueueConfig,
    shutdown_tx: mpsc::Sender<()>,
}

impl ThumbnailQueue {
    /// Create a new ThumbnailQueue and spawn its worker pool.
    ///
    /// If `pool` is `Some`, the worker uses PostgreSQL LISTEN/NOTIFY to wake
    /// immediately when jobs are created, in addition to polling at
    /// `poll_interval_ms`. If `pool` is `None`, only polling is used.
    pub fn new(
        repository: ThumbnailJobRepository,
        config: ThumbnailQueueConfig,
        handler: Arc<dyn ThumbnailHandler>,
        pool: Option<sqlx::PgPool>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let repo_clone = repository.clone();
        let config_clone = config.clone();

        tokio::spawn(async move {
            Self::worker_pool(repo_clone, config_clone, handler, shutdown_rx, pool).await;
        });

        Self {
            repository,
            config,
            shutdown_tx,
        }
    }

    /// Submit a thumbnail job for an uploaded image.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, file_id: Uuid, user_id: Uuid) -> Result<Uuid> {
        let job = self
            .repository
            .create(file_id, user_id, self.config.max_retries)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    file_id = %file_id,
                    "Failed to create thumbnail job in repository"
                );
                anyhow::anyhow!("Failed to create thumbnail job in repository: {}", e)
            })?;

        tracing::info!(job_id = %job.id, file_id = %file_id, "Thumbnail job submitted to queue");

        Ok(job.id)
    }

    async fn worker_pool(
        repository: ThumbnailJobRepository,
        config: ThumbnailQueueConfig,
        handler: Arc<dyn ThumbnailHandler>,
        mut shutdown_rx: mpsc::Receiver<()>,
        pool: Option<sqlx::PgPool>,
    ) {
        let use_listen = pool.is_some();
        tracing::info!(
            max_workers = config.max_workers,
            poll_interval_ms = config.poll_interval_ms,
            listen_notify = use_listen,
            "Thumbnail worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        // Wakes the main loop when LISTEN receives a NOTIFY, without blocking
        // on recv when no pool was provided.
        let (notify_tx, mut notify_rx) = mpsc::channel::<()>(16);
        if let Some(pool) = pool {
            let tx = notify_tx.clone();
            tokio::spawn(async move {
                loop {
                    match sqlx::postgres::PgListener::connect_with(&pool).await {
                        Ok(mut listener) => {
                            if let Err(e) = listener.listen(THUMBNAIL_JOB_NOTIFY_CHANNEL).await {
                                tracing::warn!(error = %e, "LISTEN failed, will retry");
                                tokio::time::sleep(Duration::from_secs(5)).await;
                                continue;
                            }
                            while listener.recv().await.is_ok() {
                                let _ = tx.send(()).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "PgListener connect failed, will retry");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    }
                }
            });
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Thumbnail worker pool shutting down");
                    break;
                }
                _ = notify_rx.recv() => {
                    Self::claim_and_dispatch_one(&repository, &semaphore, &handler).await;
                }
                _ = sleep(poll_interval) => {
                    Self::claim_and_dispatch_one(&repository, &semaphore, &handler).await;
                }
            }
        }

        tracing::info!("Thumbnail worker pool stopped");
    }

    async fn claim_and_dispatch_one(
        repository: &ThumbnailJobRepository,
        semaphore: &Arc<Semaphore>,
        handler: &Arc<dyn ThumbnailHandler>,
    ) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("No workers available, skipping claim");
                return;
            }
        };

        match repository.claim_next().await {
            Ok(Some(job)) => {
                let repo = repository.clone();
                let handler = handler.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = Self::process_job_with_retry(job, repo, handler).await {
                        tracing::error!(error = %e, "Job processing failed after retries");
                    }
                });
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No jobs available in queue");
            }
            Err(e) => {
                drop(permit);
                tracing::error!(error = %e, "Failed to claim job from queue");
            }
        }
    }

    #[tracing::instrument(skip(repository, handler), fields(job.id = %job.id, job.file_id = %job.file_id))]
    async fn process_job_with_retry(
        job: ThumbnailJob,
        repository: ThumbnailJobRepository,
        handler: Arc<dyn ThumbnailHandler>,
    ) -> Result<()> {
        match handler.process_job(&job).await {
            Ok(_result) => {
                repository
                    .mark_completed(job.id)
                    .await
                    .context("Failed to mark job as completed")?;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    error = %e,
                    retry_count = job.retry_count,
                    max_retries = job.max_retries,
                    "Job execution failed"
                );

                // Requeue with a future due time rather than sleeping here, so
                // the worker slot frees up for other jobs during the backoff.
                if let Some(backoff_seconds) = requeue_delay(&job) {
                    tracing::info!(
                        job_id = %job.id,
                        retry_count = job.retry_count + 1,
                        backoff_seconds = backoff_seconds,
                        "Scheduling job retry"
                    );
                    repository.increment_retry(job.id, backoff_seconds).await?;
                    Ok(())
                } else {
                    let error_result = json!({
                        "error": e.to_string(),
                        "retry_count": job.retry_count,
                        "reason": "Job failed after maximum retries"
                    });
                    repository
                        .mark_failed(job.id, error_result)
                        .await
                        .context("Failed to mark job as failed")?;
                    Err(e)
                }
            }
        }
    }

    /// Signals the worker pool to stop claiming new jobs and exit the main
    /// loop. Returns immediately; already-spawned job handlers keep running
    /// until they complete.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating thumbnail queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Clone for ThumbnailQueue {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            config: self.config.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_backoff_exponential_then_capped() {
        assert_eq!(compute_retry_backoff_seconds(0), 1);
        assert_eq!(compute_retry_backoff_seconds(1), 2);
        assert_eq!(compute_retry_backoff_seconds(2), 4);
        assert_eq!(compute_retry_backoff_seconds(8), 256);
        assert_eq!(compute_retry_backoff_seconds(9), MAX_RETRY_BACKOFF_SECS);
        assert_eq!(compute_retry_backoff_seconds(10), MAX_RETRY_BACKOFF_SECS);
    }

    fn failed_job(retry_count: i32, max_retries: i32) -> ThumbnailJob {
        use filedepot_core::models::ThumbnailJobStatus;
        let now = chrono::Utc::now();
        ThumbnailJob {
            id: Uuid::new_v4(),
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: ThumbnailJobStatus::Running,
            error: None,
            retry_count,
            max_retries,
            created_at: now,
            scheduled_at: now,
            started_at: Some(now),
            completed_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn requeue_delay_grows_until_budget_spent() {
        assert_eq!(requeue_delay(&failed_job(0, 3)), Some(1));
        assert_eq!(requeue_delay(&failed_job(2, 3)), Some(4));
        assert_eq!(requeue_delay(&failed_job(3, 3)), None);
    }

    #[test]
    fn default_config_bounds_workers() {
        let config = ThumbnailQueueConfig::default();
        assert!(config.max_workers >= 1);
        assert_eq!(config.max_retries, 3);
    }
}
