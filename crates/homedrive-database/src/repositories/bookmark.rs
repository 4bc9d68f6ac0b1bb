//! Bookmark queries against PostgreSQL.

use sqlx::PgConnection;
use uuid::Uuid;

use homedrive_core::error::{AppError, ErrorKind};
use homedrive_core::result::AppResult;
use homedrive_entity::bookmark::Bookmark;

/// Bookmark queries keyed by `(owner_id, folder_id)`.
#[derive(Debug, Clone, Copy)]
pub struct BookmarkRepository;

impl BookmarkRepository {
    /// List an owner's bookmarks, newest first.
    pub async fn find_by_owner(conn: &mut PgConnection, owner_id: Uuid) -> AppResult<Vec<Bookmark>> {
        sqlx::query_as::<_, Bookmark>(
            "SELECT * FROM bookmarks WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list bookmarks", e))
    }

    /// Pin a folder.
    pub async fn create(
        conn: &mut PgConnection,
        owner_id: Uuid,
        folder_id: Uuid,
    ) -> AppResult<Bookmark> {
        sqlx::query_as::<_, Bookmark>(
            "INSERT INTO bookmarks (owner_id, folder_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(owner_id)
        .bind(folder_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("bookmarks_pkey") => {
                AppError::conflict(format!("Folder {folder_id} is already bookmarked"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create bookmark", e),
        })
    }

    /// Unpin any of `folder_ids`.
    pub async fn delete_many(
        conn: &mut PgConnection,
        owner_id: Uuid,
        folder_ids: &[Uuid],
    ) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM bookmarks WHERE owner_id = $1 AND folder_id = ANY($2)")
                .bind(owner_id)
                .bind(folder_ids)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete bookmarks", e)
                })?;
        Ok(result.rows_affected())
    }
}
