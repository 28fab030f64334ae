pub mod credentials;
pub mod middleware;
pub mod models;

pub use models::CurrentUser;
