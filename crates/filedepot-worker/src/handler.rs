//! Thumbnail job handler
//!
//! The worker calls [`ThumbnailHandler::process_job`] for each claimed job.
//! [`ThumbnailProcessor`] is the production implementation: it loads the file
//! record, reads the original blob, renders the derivative set, and writes
//! each derivative next to the original under a width-suffixed key.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use filedepot_core::models::{FileKind, ThumbnailJob};
use filedepot_db::FileRepository;
use filedepot_processing::render_thumbnail_set;
use filedepot_storage::{derivative_key, Storage};

#[async_trait]
pub trait ThumbnailHandler: Send + Sync {
    /// Process a claimed job and return a result payload for the job record.
    async fn process_job(self: Arc<Self>, job: &ThumbnailJob) -> Result<serde_json::Value>;
}

pub struct ThumbnailProcessor {
    files: FileRepository,
    storage: Arc<dyn Storage>,
}

impl ThumbnailProcessor {
    pub fn new(files: FileRepository, storage: Arc<dyn Storage>) -> Self {
        Self { files, storage }
    }
}

#[async_trait]
impl ThumbnailHandler for ThumbnailProcessor {
    #[tracing::instrument(skip(self, job), fields(job.id = %job.id, job.file_id = %job.file_id))]
    async fn process_job(self: Arc<Self>, job: &ThumbnailJob) -> Result<serde_json::Value> {
        let file = self
            .files
            .get_owned(job.user_id, job.file_id)
            .await
            .map_err(|e| anyhow!("Failed to load file for job: {}", e))?
            .ok_or_else(|| anyhow!("File {} no longer exists", job.file_id))?;

        if file.kind != FileKind::Image {
            return Err(anyhow!("File {} is not an image", file.id));
        }

        let storage_key = file
            .storage_key
            .as_deref()
            .ok_or_else(|| anyhow!("File {} has no stored content", file.id))?;

        let original = self
            .storage
            .read(storage_key)
            .await
            .context("Failed to read original image")?;

        // CPU-bound decode/resize runs on the blocking pool so it does not
        // stall the worker's async executor.
        let thumbnails = tokio::task::spawn_blocking(move || render_thumbnail_set(&original))
            .await
            .context("Thumbnail rendering task panicked")?
            .context("Failed to render thumbnails")?;

        let mut widths = Vec::with_capacity(thumbnails.len());
        for (width, bytes) in thumbnails {
            let key = derivative_key(storage_key, width);
            self.storage
                .write_at(&key, bytes)
                .await
                .with_context(|| format!("Failed to write {}px thumbnail", width))?;
            widths.push(width);
        }

        tracing::info!(
            file_id = %file.id,
            widths = ?widths,
            "Thumbnail set generated"
        );

        Ok(json!({
            "storage_key": storage_key,
            "widths": widths,
        }))
    }
}
