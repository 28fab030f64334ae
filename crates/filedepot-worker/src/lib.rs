pub mod handler;
pub mod queue;

pub use handler::{ThumbnailHandler, ThumbnailProcessor};
pub use queue::{ThumbnailQueue, ThumbnailQueueConfig};
