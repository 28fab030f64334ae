//! Filedepot core library
//!
//! Shared models, configuration, and error types used by every other crate in
//! the workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
