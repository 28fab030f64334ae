//! Filedepot blob storage
//!
//! Storage abstraction and the local-filesystem backend. Blobs are addressed
//! by opaque locator keys; derivative images live at `{key}_{width}` next to
//! the original.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all call sites stay consistent.

pub mod keys;
pub mod local;
pub mod traits;

pub use keys::{derivative_key, new_key};
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
