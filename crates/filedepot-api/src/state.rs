//! Application state shared across handlers.

use filedepot_core::Config;
use filedepot_db::{FileRepository, SessionRepository, ThumbnailJobRepository, UserRepository};
use filedepot_storage::Storage;
use filedepot_worker::ThumbnailQueue;
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub users: UserRepository,
    pub files: FileRepository,
    pub sessions: SessionRepository,
    pub jobs: ThumbnailJobRepository,
    pub storage: Arc<dyn Storage>,
    pub thumbnail_queue: ThumbnailQueue,
}
