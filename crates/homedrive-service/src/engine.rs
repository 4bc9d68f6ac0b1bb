//! The engine facade: every entry point exposed to the transport layer.

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use homedrive_core::config::DriveConfig;
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::BlobStore;
use homedrive_database::DriveStore;
use homedrive_entity::bookmark::{Bookmark, BookmarkEntry};
use homedrive_entity::drive::{Drive, DriveQuota};
use homedrive_entity::file::File;
use homedrive_entity::folder::Folder;
use homedrive_entity::node::{DirectoryListing, NodeRef};

use crate::bookmark::BookmarkService;
use crate::context::RequestContext;
use crate::drive::{DriveService, QuotaLedger};
use crate::file::{DownloadResult, DownloadService, FileService, UploadService};
use crate::folder::{CascadeOrchestrator, FolderService, HardDeleteReport};
use crate::listing::ListingService;
use crate::path::{ParentContext, PathResolver};

/// Folder-hierarchy engine over one record store and one blob backend.
#[derive(Debug, Clone)]
pub struct DriveEngine {
    drives: DriveService,
    quota: QuotaLedger,
    resolver: PathResolver,
    folders: FolderService,
    cascade: CascadeOrchestrator,
    files: FileService,
    uploads: UploadService,
    downloads: DownloadService,
    bookmarks: BookmarkService,
    listings: ListingService,
}

impl DriveEngine {
    /// Wire every service onto the shared store and blob backend.
    pub fn new(store: Arc<dyn DriveStore>, blobs: Arc<dyn BlobStore>, config: DriveConfig) -> Self {
        Self {
            drives: DriveService::new(Arc::clone(&store), config.clone()),
            quota: QuotaLedger::new(Arc::clone(&store)),
            resolver: PathResolver::new(Arc::clone(&store)),
            folders: FolderService::new(Arc::clone(&store), config.clone()),
            cascade: CascadeOrchestrator::new(Arc::clone(&store), Arc::clone(&blobs)),
            files: FileService::new(Arc::clone(&store), Arc::clone(&blobs), config.clone()),
            uploads: UploadService::new(Arc::clone(&store), Arc::clone(&blobs), config),
            downloads: DownloadService::new(Arc::clone(&store), blobs),
            bookmarks: BookmarkService::new(Arc::clone(&store)),
            listings: ListingService::new(store),
        }
    }

    // -- Drives --

    /// Create a new owner's drive. `Conflict` if one exists.
    pub async fn provision_drive(&self, owner_id: Uuid) -> AppResult<Drive> {
        self.drives.provision_drive(owner_id).await
    }

    /// The caller's drive, or `NotFound`.
    pub async fn get_drive(&self, ctx: &RequestContext) -> AppResult<Drive> {
        self.drives.get_drive(ctx).await
    }

    /// Used and available bytes of a drive.
    pub async fn drive_usage(&self, ctx: &RequestContext, drive_id: Uuid) -> AppResult<DriveQuota> {
        self.quota.usage(ctx, drive_id).await
    }

    /// Admit `bytes` against the quota. `false` means refused and nothing changed.
    pub async fn reserve_space(
        &self,
        ctx: &RequestContext,
        drive_id: Uuid,
        bytes: i64,
    ) -> AppResult<bool> {
        self.quota.reserve(ctx, drive_id, bytes).await
    }

    /// Return `bytes` to the quota, floored at zero.
    pub async fn release_space(&self, ctx: &RequestContext, drive_id: Uuid, bytes: i64) -> AppResult<()> {
        self.quota.release(ctx, drive_id, bytes).await
    }

    // -- Paths and listings --

    /// Map an absolute path under `/home` (or a virtual root) to a node.
    pub async fn resolve_path(&self, ctx: &RequestContext, path: &str) -> AppResult<NodeRef> {
        self.resolver.resolve_path(ctx, path).await
    }

    /// The folder record and absolute path behind a parent reference.
    pub async fn resolve_parent_context(
        &self,
        ctx: &RequestContext,
        node: NodeRef,
    ) -> AppResult<ParentContext> {
        self.resolver.resolve_parent_context(ctx, node).await
    }

    /// Absolute path of a node.
    pub async fn resolve_folder_path(&self, ctx: &RequestContext, node: NodeRef) -> AppResult<String> {
        self.resolver.resolve_folder_path(ctx, node).await
    }

    /// Active children of `home` or a folder, sorted by name.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        node: NodeRef,
    ) -> AppResult<DirectoryListing> {
        self.listings.list_children(ctx, node).await
    }

    /// Top-level trash contents.
    pub async fn list_trash(&self, ctx: &RequestContext) -> AppResult<DirectoryListing> {
        self.listings.list_trash(ctx).await
    }

    // -- Folders --

    /// Create a folder. `Conflict` when the name is taken under the parent.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        drive_id: Uuid,
        parent: NodeRef,
        name: &str,
    ) -> AppResult<Folder> {
        self.folders.create_folder(ctx, drive_id, parent, name).await
    }

    /// Rename a folder and rewrite its subtree's paths atomically.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        self.folders.rename_folder(ctx, folder_id, new_name).await
    }

    /// Move a folder with its subtree. `CycleRejected` for a destination inside it.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        destination: NodeRef,
    ) -> AppResult<Folder> {
        self.folders.move_folder(ctx, folder_id, destination).await
    }

    /// Move a folder and its subtree to trash.
    pub async fn soft_delete_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        self.folders.soft_delete_folder(ctx, folder_id).await
    }

    /// Restore a trashed folder.
    pub async fn recover_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        self.folders.recover_folder(ctx, folder_id).await
    }

    /// Permanently delete a folder subtree and free its bytes. Safe to retry.
    pub async fn hard_delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        drive_id: Uuid,
    ) -> AppResult<HardDeleteReport> {
        self.cascade.hard_delete_folder(ctx, folder_id, drive_id).await
    }

    // -- Files --

    /// Upload a file. On `QuotaExceeded` no record is kept and the blob is released.
    pub async fn create_file(
        &self,
        ctx: &RequestContext,
        drive_id: Uuid,
        parent: NodeRef,
        name: &str,
        data: Bytes,
    ) -> AppResult<File> {
        self.uploads.create_file(ctx, drive_id, parent, name, data).await
    }

    /// A file record with its bytes.
    pub async fn open_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<DownloadResult> {
        self.downloads.open_file(ctx, file_id).await
    }

    /// Rename a file in place.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        new_name: &str,
    ) -> AppResult<File> {
        self.files.rename_file(ctx, file_id, new_name).await
    }

    /// Move a file under another parent.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        destination: NodeRef,
    ) -> AppResult<File> {
        self.files.move_file(ctx, file_id, destination).await
    }

    /// Move a file to trash.
    pub async fn soft_delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        self.files.soft_delete_file(ctx, file_id).await
    }

    /// Restore a trashed file.
    pub async fn recover_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        self.files.recover_file(ctx, file_id).await
    }

    /// Delete a file for good. Returns the bytes freed, 0 if it was already gone.
    pub async fn hard_delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<i64> {
        self.files.hard_delete_file(ctx, file_id).await
    }

    // -- Bookmarks --

    /// Bookmark a folder. `Conflict` when already bookmarked.
    pub async fn add_bookmark(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Bookmark> {
        self.bookmarks.add_bookmark(ctx, folder_id).await
    }

    /// Remove a bookmark. Returns whether one existed.
    pub async fn remove_bookmark(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<bool> {
        self.bookmarks.remove_bookmark(ctx, folder_id).await
    }

    /// The caller's bookmarks with their folders.
    pub async fn list_bookmarks(&self, ctx: &RequestContext) -> AppResult<Vec<BookmarkEntry>> {
        self.bookmarks.list_bookmarks(ctx).await
    }
}
