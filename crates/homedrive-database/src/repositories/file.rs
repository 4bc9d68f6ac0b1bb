//! File queries against PostgreSQL.

use sqlx::PgConnection;
use uuid::Uuid;

use homedrive_core::error::{AppError, ErrorKind};
use homedrive_core::result::AppResult;
use homedrive_entity::file::{CreateFile, File};

/// Name of the unique index on `(owner_id, parent_id, name)`.
const NAME_CONSTRAINT: &str = "files_owner_parent_name_key";

/// File CRUD queries, run on the caller's connection.
#[derive(Debug, Clone, Copy)]
pub struct FileRepository;

impl FileRepository {
    /// Find a file by ID.
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Find a file by parent and name (for duplicate checking).
    pub async fn find_by_parent_and_name(
        conn: &mut PgConnection,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             AND name = $3",
        )
        .bind(owner_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file by name", e))
    }

    /// List files directly inside a parent (`None` = home root).
    pub async fn find_children(
        conn: &mut PgConnection,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Files whose parent is in `parent_ids`.
    pub async fn find_by_parents(
        conn: &mut PgConnection,
        parent_ids: &[Uuid],
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE parent_id = ANY($1)")
            .bind(parent_ids)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find files by parent", e)
            })
    }

    /// Trashed files of an owner.
    pub async fn find_trashed(conn: &mut PgConnection, owner_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND is_removed ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trashed files", e))
    }

    /// Create a new file record.
    pub async fn create(conn: &mut PgConnection, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (owner_id, drive_id, parent_id, name, size_bytes, storage_handle) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.drive_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(data.size_bytes)
        .bind(&data.storage_handle)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_name_conflict(e, &data.name, "Failed to create file"))
    }

    /// Write the mutable columns of a file.
    pub async fn update(conn: &mut PgConnection, file: &File) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET parent_id = $2, name = $3, is_removed = $4, modified_at = $5 \
             WHERE id = $1 RETURNING *",
        )
        .bind(file.id)
        .bind(file.parent_id)
        .bind(&file.name)
        .bind(file.is_removed)
        .bind(file.modified_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_name_conflict(e, &file.name, "Failed to update file"))?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", file.id)))
    }

    /// Delete files by ID.
    pub async fn delete_many(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM files WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete files", e))?;
        Ok(result.rows_affected())
    }
}

fn map_name_conflict(e: sqlx::Error, name: &str, context: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(NAME_CONSTRAINT) => {
            AppError::conflict(format!("File '{name}' already exists in this folder"))
        }
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), e),
    }
}
