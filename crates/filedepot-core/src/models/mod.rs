//! Domain models and request/response DTOs.

mod file;
mod job;
mod session;
mod user;

pub use file::{FileKind, FileRecord, FileResponse, UploadRequest};
pub use job::{ThumbnailJob, ThumbnailJobStatus};
pub use session::{AuthSession, TokenResponse};
pub use user::{CreateUserRequest, User, UserResponse};
