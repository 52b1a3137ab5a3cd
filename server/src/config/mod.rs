use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "sqlite://conbook.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MEDIA_DIR: &str = "./media";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Offset applied to the naive date/time fields of an event.
    pub event_utc_offset: FixedOffset,
    pub cors_allowed_origins: String,
    /// Enables HSTS; set from `RUST_ENV=production`.
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!("Config: invalid BIND_ADDR '{}': {}", raw, e);
                    None
                }
            })
            .unwrap_or_else(default_bind_addr);

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let offset_minutes = env::var("EVENT_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|raw| raw.parse::<i32>().ok())
            .unwrap_or(0);

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            media_dir: env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MEDIA_DIR)),
            max_upload_bytes,
            event_utc_offset: offset_from_minutes(offset_minutes),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| cors::DEFAULT_ALLOWED_ORIGINS.to_string()),
            production: env::var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
        }
    }

    /// Configuration for tests: in-memory database, caller-provided media dir.
    pub fn for_tests(media_dir: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: default_bind_addr(),
            media_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            event_utc_offset: offset_from_minutes(0),
            cors_allowed_origins: cors::DEFAULT_ALLOWED_ORIGINS.to_string(),
            production: false,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3001)))
}

fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            tracing::warn!(
                "Config: EVENT_UTC_OFFSET_MINUTES={} out of range, using UTC",
                minutes
            );
            Utc.fix()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_from_minutes() {
        assert_eq!(offset_from_minutes(480).local_minus_utc(), 8 * 3600);
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
    }

    #[test]
    fn test_default_bind_addr_parses() {
        assert_eq!(default_bind_addr().port(), 3001);
    }
}
