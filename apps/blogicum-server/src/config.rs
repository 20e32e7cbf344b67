//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use blogicum_core::pagination::DEFAULT_PAGE_SIZE;
use blogicum_infra::JwtConfig;
use blogicum_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub posts_per_page: u64,
    /// Uploaded and seeded post images live under `MEDIA_ROOT/posts_images`.
    pub media_root: PathBuf,
    pub static_root: PathBuf,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| {
                let mut config = DatabaseConfig::new(url);
                if let Some(max) = parse_var("DB_MAX_CONNECTIONS") {
                    config.max_connections = max;
                }
                if let Some(min) = parse_var("DB_MIN_CONNECTIONS") {
                    config.min_connections = min;
                }
                config
            });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8000),
            database,
            posts_per_page: parse_var("POSTS_PER_PAGE").unwrap_or(DEFAULT_PAGE_SIZE),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media")),
            static_root: env::var("STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}
