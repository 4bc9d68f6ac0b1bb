//! Record store traits.
//!
//! Every structural mutation of the tree runs inside one
//! [`StoreTransaction`]: its writes become visible to other units of work
//! only on [`StoreTransaction::commit`], and are discarded on rollback or
//! drop.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use homedrive_core::result::AppResult;
use homedrive_entity::bookmark::Bookmark;
use homedrive_entity::drive::{CreateDrive, Drive};
use homedrive_entity::file::{CreateFile, File};
use homedrive_entity::folder::{CreateFolder, Folder};

/// A durable store for drives, folders, files, and bookmarks.
#[async_trait]
pub trait DriveStore: Send + Sync + fmt::Debug + 'static {
    /// Open a new unit of work.
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>>;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// One atomic unit of work against a [`DriveStore`].
#[async_trait]
pub trait StoreTransaction: Send {
    // -- Drives --

    /// Find a drive by ID.
    async fn find_drive(&mut self, id: Uuid) -> AppResult<Option<Drive>>;

    /// Find the drive owned by a user.
    async fn find_drive_by_owner(&mut self, owner_id: Uuid) -> AppResult<Option<Drive>>;

    /// Create a drive. Fails with `Conflict` if the owner already has one.
    async fn insert_drive(&mut self, data: &CreateDrive) -> AppResult<Drive>;

    /// Atomically add `bytes` to `space_used` if the result stays within
    /// `space_total`. Returns `None` (and changes nothing) when refused or
    /// when the drive does not exist.
    async fn reserve_space(&mut self, drive_id: Uuid, bytes: i64) -> AppResult<Option<Drive>>;

    /// Subtract `bytes` from `space_used`, floored at zero. Returns `None`
    /// when the drive does not exist.
    async fn release_space(&mut self, drive_id: Uuid, bytes: i64) -> AppResult<Option<Drive>>;

    // -- Folders --

    /// Find a folder by ID.
    async fn find_folder(&mut self, id: Uuid) -> AppResult<Option<Folder>>;

    /// Lock folder rows until the unit of work ends and return their latest
    /// committed state, ordered by ID. Absent IDs are skipped.
    ///
    /// Any operation that reads a folder in order to write below it or
    /// to rewrite it takes this lock first. Concurrent writers on the same
    /// rows then apply one after the other.
    async fn lock_folders(&mut self, ids: &[Uuid]) -> AppResult<Vec<Folder>>;

    /// Find a folder by exact absolute path within an owner's namespace.
    async fn find_folder_by_path(&mut self, owner_id: Uuid, path: &str)
    -> AppResult<Option<Folder>>;

    /// All folders strictly below `path` on a segment boundary, ordered by
    /// path.
    async fn find_descendant_folders(&mut self, owner_id: Uuid, path: &str)
    -> AppResult<Vec<Folder>>;

    /// Direct child folders of a parent (`None` = home), in any trash
    /// state, ordered by name.
    async fn find_child_folders(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>>;

    /// Folders whose parent is any of `parent_ids`.
    async fn find_folders_by_parents(&mut self, parent_ids: &[Uuid]) -> AppResult<Vec<Folder>>;

    /// Folders trashed directly by the owner, ordered by name.
    async fn find_trashed_folders(&mut self, owner_id: Uuid) -> AppResult<Vec<Folder>>;

    /// Create a folder. Fails with `Conflict` on a duplicate path.
    async fn insert_folder(&mut self, data: &CreateFolder) -> AppResult<Folder>;

    /// Persist every mutable column of a folder. Fails with `NotFound`
    /// if the row is gone and `Conflict` on a duplicate path.
    async fn update_folder(&mut self, folder: &Folder) -> AppResult<Folder>;

    /// Delete folders by ID. Absent rows are ignored.
    async fn delete_folders(&mut self, ids: &[Uuid]) -> AppResult<u64>;

    // -- Files --

    /// Find a file by ID.
    async fn find_file(&mut self, id: Uuid) -> AppResult<Option<File>>;

    /// Find a file by parent and name (for duplicate checking).
    async fn find_file_by_name(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<File>>;

    /// Direct child files of a parent (`None` = home), in any trash state,
    /// ordered by name.
    async fn find_child_files(
        &mut self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<File>>;

    /// Files whose parent is any of `parent_ids`.
    async fn find_files_by_parents(&mut self, parent_ids: &[Uuid]) -> AppResult<Vec<File>>;

    /// Trashed files of an owner, ordered by name.
    async fn find_trashed_files(&mut self, owner_id: Uuid) -> AppResult<Vec<File>>;

    /// Create a file record. Fails with `Conflict` on a duplicate name.
    async fn insert_file(&mut self, data: &CreateFile) -> AppResult<File>;

    /// Persist every mutable column of a file.
    async fn update_file(&mut self, file: &File) -> AppResult<File>;

    /// Delete files by ID. Absent rows are ignored.
    async fn delete_files(&mut self, ids: &[Uuid]) -> AppResult<u64>;

    // -- Bookmarks --

    /// Bookmarks of an owner, newest first.
    async fn find_bookmarks(&mut self, owner_id: Uuid) -> AppResult<Vec<Bookmark>>;

    /// Create a bookmark. Fails with `Conflict` if it already exists.
    async fn insert_bookmark(&mut self, owner_id: Uuid, folder_id: Uuid) -> AppResult<Bookmark>;

    /// Delete the owner's bookmarks on any of `folder_ids`. Absent
    /// bookmarks are ignored.
    async fn delete_bookmarks(&mut self, owner_id: Uuid, folder_ids: &[Uuid]) -> AppResult<u64>;

    // -- Lifecycle --

    /// Publish every write made in this unit of work.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard every write made in this unit of work.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
