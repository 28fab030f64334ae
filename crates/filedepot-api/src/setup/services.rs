//! Repository, storage, and worker initialization.

use anyhow::{Context, Result};
use filedepot_core::Config;
use filedepot_db::{FileRepository, SessionRepository, ThumbnailJobRepository, UserRepository};
use filedepot_storage::{LocalStorage, Storage};
use filedepot_worker::{ThumbnailProcessor, ThumbnailQueue, ThumbnailQueueConfig};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Interval between sweeps of expired session rows.
const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;

/// Build the application state: repositories, blob storage, and the thumbnail
/// worker pool.
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<crate::state::AppState>> {
    tracing::info!(folder_path = %config.folder_path, "Initializing blob storage");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(config.folder_path.clone())
            .await
            .context("Failed to initialize local storage")?,
    );

    let users = UserRepository::new(pool.clone());
    let files = FileRepository::new(pool.clone());
    let sessions = SessionRepository::new(pool.clone(), config.session_ttl_hours);
    let jobs = ThumbnailJobRepository::new(pool.clone());

    let handler = Arc::new(ThumbnailProcessor::new(files.clone(), storage.clone()));
    let thumbnail_queue = ThumbnailQueue::new(
        jobs.clone(),
        ThumbnailQueueConfig {
            max_workers: config.thumbnail_max_workers,
            poll_interval_ms: config.thumbnail_poll_interval_ms,
            max_retries: config.thumbnail_max_retries,
        },
        handler,
        Some(pool.clone()),
    );

    spawn_session_purger(sessions.clone());

    Ok(Arc::new(crate::state::AppState {
        config: config.clone(),
        pool,
        users,
        files,
        sessions,
        jobs,
        storage,
        thumbnail_queue,
    }))
}

/// Periodically delete expired session rows. Expiry is already enforced at
/// resolve time; this keeps the table from growing without bound.
fn spawn_session_purger(sessions: SessionRepository) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Expired sessions purged"),
                Err(e) => tracing::error!(error = %e, "Session purge failed"),
            }
        }
    });
}
