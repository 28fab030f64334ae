//! Configuration module
//!
//! Environment-driven configuration for the API server, storage root, and the
//! thumbnail worker pool. `.env` files are honored via dotenvy.

use anyhow::{Context, Result};

// Defaults
const SERVER_PORT: u16 = 5000;
const FOLDER_PATH: &str = "/tmp/files_manager";
const DB_MAX_CONNECTIONS: u32 = 20;
const DB_TIMEOUT_SECONDS: u64 = 30;
const SESSION_TTL_HOURS: i64 = 24;
const THUMBNAIL_MAX_WORKERS: usize = 4;
const THUMBNAIL_POLL_INTERVAL_MS: u64 = 1000;
const THUMBNAIL_MAX_RETRIES: i32 = 3;
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    /// Root directory for stored blobs, created on demand.
    pub folder_path: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Fixed session lifetime; no sliding expiration.
    pub session_ttl_hours: i64,
    pub thumbnail_max_workers: usize,
    pub thumbnail_poll_interval_ms: u64,
    pub thumbnail_max_retries: i32,
    pub max_upload_bytes: usize,
    pub environment: String,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Kept separate from
    /// `from_env` so tests do not have to mutate process-global state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .context("DATABASE_URL must be set (e.g. postgres://localhost/filedepot)")?;

        Ok(Config {
            database_url,
            server_port: parse_or(&lookup, "PORT", SERVER_PORT)?,
            folder_path: lookup("FOLDER_PATH").unwrap_or_else(|| FOLDER_PATH.to_string()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or(&lookup, "DB_TIMEOUT_SECONDS", DB_TIMEOUT_SECONDS)?,
            session_ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", SESSION_TTL_HOURS)?,
            thumbnail_max_workers: parse_or(
                &lookup,
                "THUMBNAIL_MAX_WORKERS",
                THUMBNAIL_MAX_WORKERS,
            )?,
            thumbnail_poll_interval_ms: parse_or(
                &lookup,
                "THUMBNAIL_POLL_INTERVAL_MS",
                THUMBNAIL_POLL_INTERVAL_MS,
            )?,
            thumbnail_max_retries: parse_or(
                &lookup,
                "THUMBNAIL_MAX_RETRIES",
                THUMBNAIL_MAX_RETRIES,
            )?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES)?,
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("Invalid value for {}: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/fd")]))
                .unwrap();
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.folder_path, "/tmp/files_manager");
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.thumbnail_max_workers, 4);
        assert_eq!(config.thumbnail_max_retries, 3);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/fd"),
            ("PORT", "8080"),
            ("FOLDER_PATH", "/var/lib/filedepot"),
            ("THUMBNAIL_MAX_WORKERS", "8"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.folder_path, "/var/lib/filedepot");
        assert_eq!(config.thumbnail_max_workers, 8);
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_missing_database_url() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_invalid_numeric_value() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/fd"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }
}
