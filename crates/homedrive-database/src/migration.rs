//! Schema migrations embedded from the workspace `migrations/` directory.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use homedrive_core::error::{AppError, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply pending migrations. Returns how many migrations the binary knows.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, AppError> {
    let known = MIGRATOR.iter().count();
    info!(known, "Applying record store migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
    })?;

    Ok(known)
}
