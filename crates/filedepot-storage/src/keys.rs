//! Storage key construction.
//!
//! Locators are opaque uuid strings; derivative blobs append `_{width}` to the
//! original locator so they sit next to it in any backend.

use uuid::Uuid;

/// Generate a fresh unique locator.
pub fn new_key() -> String {
    Uuid::new_v4().to_string()
}

/// Key of a resized derivative of the blob at `key`.
pub fn derivative_key(key: &str, width: u32) -> String {
    format!("{}_{}", key, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_key_is_unique() {
        assert_ne!(new_key(), new_key());
    }

    #[test]
    fn test_derivative_key_suffix() {
        assert_eq!(derivative_key("abc", 100), "abc_100");
        assert_eq!(derivative_key("abc", 500), "abc_500");
    }
}
