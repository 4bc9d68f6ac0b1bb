//! PostgreSQL-backed [`DriveStore`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use homedrive_core::error::{AppError, ErrorKind};
use homedrive_core::result::AppResult;
use homedrive_entity::bookmark::Bookmark;
use homedrive_entity::drive::{CreateDrive, Drive};
use homedrive_entity::file::{CreateFile, File};
use homedrive_entity::folder::{CreateFolder, Folder};

use crate::connection::DatabasePool;
use crate::repositories::{
    BookmarkRepository, DriveRepository, FileRepository, FolderRepository,
};
use crate::store::{DriveStore, StoreTransaction};

/// Store backed by a PostgreSQL pool. Each unit of work is one SQL
/// transaction.
#[derive(Debug, Clone)]
pub struct PgDriveStore {
    pool: PgPool,
}

impl PgDriveStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<DatabasePool> for PgDriveStore {
    fn from(db: DatabasePool) -> Self {
        Self::new(db.into_pool())
    }
}

#[async_trait]
impl DriveStore for PgDriveStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}

/// An open PostgreSQL transaction. Dropping it without commit rolls back.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn find_drive(&mut self, id: Uuid) -> AppResult<Option<Drive>> {
        DriveRepository::find_by_id(&mut self.tx, id).await
    }

    async fn find_drive_by_owner(&mut self, owner_id: Uuid) -> AppResult<Option<Drive>> {
        DriveRepository::find_by_owner(&mut self.tx, owner_id).await
    }

    async fn insert_drive(&mut self, data: &CreateDrive) -> AppResult<Drive> {
        DriveRepository::create(&mut self.tx, data).await
    }

    async fn reserve_space(&mut self, drive_id: Uuid, bytes: i64) -> AppResult<Option<Drive>> {
        DriveRepository::reserve(&mut self.tx, drive_id, bytes).await
    }

    async fn release_space(&mut self, drive_id: Uuid, bytes: i64) -> AppResult<Option<Drive>> {
        DriveRepository::release(&mut self.tx, drive_id, bytes).await
    }

    async fn find_folder(&mut self, id: Uuid) -> AppResult<Option<Folder>> {
        FolderRepository::find_by_id(&mut self.tx, id).await
    }

    async fn lock_folders(&mut self, ids: &[Uuid]) -> AppResult<Vec<Folder>> {
        FolderRepository::lock_many(&mut self.tx, ids).await
    }

    async fn find_folder_by_path(
        &mut self,
        owner_id: Uuid,
        path: &str,
    ) -> AppResult<Option<Folder>> {
        FolderRepository::find_by_path(&mut self.tx, owner_id, path).await
    }

    async fn find_descendant_folders(
        &mut self,
        owner_id: Uuid,
        path: &str,
    ) -> AppResult<Vec<Folder>> {
        FolderRepository::find_descendants(&mut self.tx, owner_id, path).await
    }

    async fn find_child_folders(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        FolderRepository::find_children(&mut self.tx, owner_id, parent_id).await
    }

    async fn find_folders_by_parents(&mut self, parent_ids: &[Uuid]) -> AppResult<Vec<Folder>> {
        FolderRepository::find_by_parents(&mut self.tx, parent_ids).await
    }

    async fn find_trashed_folders(&mut self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        FolderRepository::find_trashed(&mut self.tx, owner_id).await
    }

    async fn insert_folder(&mut self, data: &CreateFolder) -> AppResult<Folder> {
        FolderRepository::create(&mut self.tx, data).await
    }

    async fn update_folder(&mut self, folder: &Folder) -> AppResult<Folder> {
        FolderRepository::update(&mut self.tx, folder).await
    }

    async fn delete_folders(&mut self, ids: &[Uuid]) -> AppResult<u64> {
        FolderRepository::delete_many(&mut self.tx, ids).await
    }

    async fn find_file(&mut self, id: Uuid) -> AppResult<Option<File>> {
        FileRepository::find_by_id(&mut self.tx, id).await
    }

    async fn find_file_by_name(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>> {
        FileRepository::find_by_parent_and_name(&mut self.tx, owner_id, parent_id, name).await
    }

    async fn find_child_files(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<File>> {
        FileRepository::find_children(&mut self.tx, owner_id, parent_id).await
    }

    async fn find_files_by_parents(&mut self, parent_ids: &[Uuid]) -> AppResult<Vec<File>> {
        FileRepository::find_by_parents(&mut self.tx, parent_ids).await
    }

    async fn find_trashed_files(&mut self, owner_id: Uuid) -> AppResult<Vec<File>> {
        FileRepository::find_trashed(&mut self.tx, owner_id).await
    }

    async fn insert_file(&mut self, data: &CreateFile) -> AppResult<File> {
        FileRepository::create(&mut self.tx, data).await
    }

    async fn update_file(&mut self, file: &File) -> AppResult<File> {
        FileRepository::update(&mut self.tx, file).await
    }

    async fn delete_files(&mut self, ids: &[Uuid]) -> AppResult<u64> {
        FileRepository::delete_many(&mut self.tx, ids).await
    }

    async fn find_bookmarks(&mut self, owner_id: Uuid) -> AppResult<Vec<Bookmark>> {
        BookmarkRepository::find_by_owner(&mut self.tx, owner_id).await
    }

    async fn insert_bookmark(&mut self, owner_id: Uuid, folder_id: Uuid) -> AppResult<Bookmark> {
        BookmarkRepository::create(&mut self.tx, owner_id, folder_id).await
    }

    async fn delete_bookmarks(&mut self, owner_id: Uuid, folder_ids: &[Uuid]) -> AppResult<u64> {
        BookmarkRepository::delete_many(&mut self.tx, owner_id, folder_ids).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })
    }
}
