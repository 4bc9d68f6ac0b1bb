//! PostgreSQL connection pool for the record store.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use homedrive_core::config::DatabaseConfig;
use homedrive_core::error::{AppError, ErrorKind};

/// Shared connection pool backing [`crate::PgDriveStore`].
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool eagerly so a bad URL fails before any command runs.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let url = config.redacted_url();
        info!(%url, max = config.max_connections, "Opening record store pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Cannot reach record store at {url}: {e}"),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn into_pool(self) -> PgPool {
        self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Record store pool closed");
    }
}
