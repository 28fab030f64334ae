//! Shared constants.

/// Thumbnail target widths in pixels, largest first. Derivative blobs are
/// stored at `{storage_key}_{width}`.
pub const THUMBNAIL_WIDTHS: [u32; 3] = [500, 250, 100];

/// Maximum number of entries returned per page by file listings.
pub const FILES_PAGE_SIZE: i64 = 20;

/// Header carrying the session token on protected routes.
pub const TOKEN_HEADER: &str = "X-Token";
