//! Folder queries against PostgreSQL.

use sqlx::PgConnection;
use uuid::Uuid;

use homedrive_core::error::{AppError, ErrorKind};
use homedrive_core::result::AppResult;
use homedrive_entity::folder::{CreateFolder, Folder};

/// Name of the unique constraint on `(owner_id, absolute_path)`.
const PATH_CONSTRAINT: &str = "folders_owner_id_absolute_path_key";

/// Folder CRUD and tree queries. Every call runs on the caller's
/// connection, which is normally an open transaction.
#[derive(Debug, Clone, Copy)]
pub struct FolderRepository;

impl FolderRepository {
    /// Find a folder by ID.
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// `SELECT … FOR UPDATE` over a set of folders. Rows are locked in ID
    /// order so two lockers of overlapping sets cannot deadlock.
    pub async fn lock_many(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock folders", e))
    }

    /// Find a folder by owner and exact absolute path.
    pub async fn find_by_path(
        conn: &mut PgConnection,
        owner_id: Uuid,
        path: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND absolute_path = $2",
        )
        .bind(owner_id)
        .bind(path)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find folder by path", e)
        })
    }

    /// All folders strictly below `path`, matched on a `/` boundary.
    pub async fn find_descendants(
        conn: &mut PgConnection,
        owner_id: Uuid,
        path: &str,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND absolute_path LIKE $2 ESCAPE '\\' \
             ORDER BY absolute_path ASC",
        )
        .bind(owner_id)
        .bind(descendant_pattern(path))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list descendants", e))
    }

    /// List direct children of a parent (`None` = home root).
    pub async fn find_children(
        conn: &mut PgConnection,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// Folders whose parent is in `parent_ids`.
    pub async fn find_by_parents(
        conn: &mut PgConnection,
        parent_ids: &[Uuid],
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE parent_id = ANY($1)")
            .bind(parent_ids)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find folders by parent", e)
            })
    }

    /// Folders the owner trashed directly.
    pub async fn find_trashed(conn: &mut PgConnection, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND is_removed AND NOT is_removed_as_child \
             ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trash", e))
    }

    /// Create a new folder.
    pub async fn create(conn: &mut PgConnection, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (owner_id, drive_id, parent_id, name, absolute_path) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.drive_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.absolute_path)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_path_conflict(e, &data.absolute_path, "Failed to create folder"))
    }

    /// Write the mutable columns of a folder.
    pub async fn update(conn: &mut PgConnection, folder: &Folder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_id = $2, name = $3, absolute_path = $4, is_removed = $5, \
             is_removed_as_child = $6, modified_at = $7 WHERE id = $1 RETURNING *",
        )
        .bind(folder.id)
        .bind(folder.parent_id)
        .bind(&folder.name)
        .bind(&folder.absolute_path)
        .bind(folder.is_removed)
        .bind(folder.is_removed_as_child)
        .bind(folder.modified_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_path_conflict(e, &folder.absolute_path, "Failed to update folder"))?
        .ok_or_else(|| AppError::not_found(format!("Folder {} not found", folder.id)))
    }

    /// Delete folders by ID.
    pub async fn delete_many(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete folders", e)
            })?;
        Ok(result.rows_affected())
    }
}

/// `LIKE` pattern matching every path strictly below `path`.
fn descendant_pattern(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len() + 2);
    for ch in path.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push_str("/%");
    escaped
}

fn map_path_conflict(e: sqlx::Error, path: &str, context: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(PATH_CONSTRAINT) => {
            AppError::conflict(format!("Folder path '{path}' already exists"))
        }
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendant_pattern_is_segment_bounded() {
        assert_eq!(descendant_pattern("/home/A"), "/home/A/%");
    }

    #[test]
    fn test_descendant_pattern_escapes_wildcards() {
        assert_eq!(descendant_pattern("/home/50%_off"), "/home/50\\%\\_off/%");
        assert_eq!(descendant_pattern("/home/a\\b"), "/home/a\\\\b/%");
    }
}
