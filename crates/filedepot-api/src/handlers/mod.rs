pub mod app;
pub mod files;
pub mod sessions;
pub mod users;
