//! Application state - shared across all handlers.

use std::path::PathBuf;
use std::sync::Arc;

use blogicum_core::BlogService;
use blogicum_core::pagination::Paginator;
use blogicum_core::ports::{PasswordService, Repositories, TokenService};
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
use blogicum_infra::DatabaseConnections;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: BlogService,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub media_root: PathBuf,
    pub static_root: PathBuf,
    /// Set when the server runs on PostgreSQL.
    #[cfg(feature = "postgres")]
    pub db: Option<DatabaseConnections>,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store
    /// when no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (db, repos) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let repos = connections.repositories();
                    (Some(connections), repos)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    (None, InMemoryStore::new().repositories())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, InMemoryStore::new().repositories())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory store");
            InMemoryStore::new().repositories()
        };

        let state = Self::with_repositories(
            repos,
            config.posts_per_page,
            config.jwt.clone(),
            config.media_root.clone(),
            config.static_root.clone(),
        );

        tracing::info!("Application state initialized");

        #[cfg(feature = "postgres")]
        let state = Self { db, ..state };

        state
    }

    pub fn with_repositories(
        repos: Repositories,
        posts_per_page: u64,
        jwt: JwtConfig,
        media_root: PathBuf,
        static_root: PathBuf,
    ) -> Self {
        Self {
            service: BlogService::new(repos, Paginator::new(posts_per_page)),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            media_root,
            static_root,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}
