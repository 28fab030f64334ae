//! Filedepot image processing
//!
//! Thumbnail rendering for the background pipeline: decode once, scale to each
//! target width preserving aspect ratio, re-encode in the source format.

pub mod thumbnail;

pub use thumbnail::{render_thumbnail_set, ThumbnailError};
