//! Filedepot database layer
//!
//! Repositories over a shared Postgres pool: users, file metadata, sessions,
//! and the thumbnail job queue. Each repository is a cheap clonable handle
//! constructed from the pool at startup and passed to the components that need
//! it — there is no ambient global client.

pub mod db;

pub use db::{
    FileRepository, SessionRepository, ThumbnailJobRepository, UserRepository,
    THUMBNAIL_JOB_NOTIFY_CHANNEL,
};
