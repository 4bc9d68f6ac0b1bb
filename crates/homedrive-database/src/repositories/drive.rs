//! Drive and quota queries against PostgreSQL.

use sqlx::PgConnection;
use uuid::Uuid;

use homedrive_core::error::{AppError, ErrorKind};
use homedrive_core::result::AppResult;
use homedrive_entity::drive::{CreateDrive, Drive};

/// Drive lookups and the atomic quota counters.
#[derive(Debug, Clone, Copy)]
pub struct DriveRepository;

impl DriveRepository {
    /// Find a drive by ID.
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Drive>> {
        sqlx::query_as::<_, Drive>("SELECT * FROM drives WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find drive", e))
    }

    /// Find the drive of an owner.
    pub async fn find_by_owner(conn: &mut PgConnection, owner_id: Uuid) -> AppResult<Option<Drive>> {
        sqlx::query_as::<_, Drive>("SELECT * FROM drives WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find drive by owner", e)
            })
    }

    /// Provision a drive.
    pub async fn create(conn: &mut PgConnection, data: &CreateDrive) -> AppResult<Drive> {
        sqlx::query_as::<_, Drive>(
            "INSERT INTO drives (owner_id, space_total) VALUES ($1, $2) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.space_total)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("drives_owner_id_key") =>
            {
                AppError::conflict(format!("Owner {} already has a drive", data.owner_id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create drive", e),
        })
    }

    /// Compare-and-increment `space_used` in a single statement.
    pub async fn reserve(
        conn: &mut PgConnection,
        drive_id: Uuid,
        bytes: i64,
    ) -> AppResult<Option<Drive>> {
        sqlx::query_as::<_, Drive>(
            "UPDATE drives SET space_used = space_used + $2 \
             WHERE id = $1 AND space_used + $2 <= space_total RETURNING *",
        )
        .bind(drive_id)
        .bind(bytes)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reserve space", e))
    }

    /// Decrement `space_used`, floored at zero.
    pub async fn release(
        conn: &mut PgConnection,
        drive_id: Uuid,
        bytes: i64,
    ) -> AppResult<Option<Drive>> {
        sqlx::query_as::<_, Drive>(
            "UPDATE drives SET space_used = GREATEST(space_used - $2, 0) WHERE id = $1 RETURNING *",
        )
        .bind(drive_id)
        .bind(bytes)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release space", e))
    }
}
