//! File rename, move, trash, and permanent delete.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use homedrive_core::config::DriveConfig;
use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::BlobStore;
use homedrive_core::types::path::{self, HOME_PATH};
use homedrive_database::{DriveStore, StoreTransaction};
use homedrive_entity::file::File;
use homedrive_entity::node::NodeRef;

use crate::context::RequestContext;
use crate::drive::QuotaLedger;
use crate::folder::cascade::release_blobs;
use crate::lookup;
use crate::path::PathResolver;

/// Tree Mutator for files.
#[derive(Debug, Clone)]
pub struct FileService {
    store: Arc<dyn DriveStore>,
    blobs: Arc<dyn BlobStore>,
    config: DriveConfig,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(store: Arc<dyn DriveStore>, blobs: Arc<dyn BlobStore>, config: DriveConfig) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    /// Rename a file in place.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        new_name: &str,
    ) -> AppResult<File> {
        path::validate_name(new_name, self.config.max_name_length)?;

        let mut tx = self.store.begin().await?;
        let mut file = lookup::load_file(tx.as_mut(), ctx, file_id).await?;
        let parent_path = visible_parent_path(tx.as_mut(), &file).await?;
        if file.name == new_name {
            return Ok(file);
        }

        lookup::ensure_name_free(
            tx.as_mut(),
            ctx.owner_id,
            file.parent_id,
            &parent_path,
            new_name,
            Some(file.id),
        )
        .await?;

        let old_name = std::mem::replace(&mut file.name, new_name.to_string());
        file.modified_at = Utc::now();
        let file = tx.update_file(&file).await?;
        tx.commit().await?;

        info!(
            owner_id = %ctx.owner_id,
            file_id = %file.id,
            from = %old_name,
            to = %file.name,
            "File renamed"
        );
        Ok(file)
    }

    /// Move a file under `destination`.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        destination: NodeRef,
    ) -> AppResult<File> {
        let mut tx = self.store.begin().await?;
        let mut file = lookup::load_file(tx.as_mut(), ctx, file_id).await?;
        visible_parent_path(tx.as_mut(), &file).await?;

        let target = PathResolver::writable_parent_in(tx.as_mut(), ctx, destination).await?;
        if target.parent_id() == file.parent_id {
            return Ok(file);
        }
        lookup::ensure_name_free(
            tx.as_mut(),
            ctx.owner_id,
            target.parent_id(),
            &target.absolute_path,
            &file.name,
            Some(file.id),
        )
        .await?;

        file.parent_id = target.parent_id();
        file.modified_at = Utc::now();
        let file = tx.update_file(&file).await?;
        tx.commit().await?;

        info!(
            owner_id = %ctx.owner_id,
            file_id = %file.id,
            to = %target.absolute_path,
            "File moved"
        );
        Ok(file)
    }

    /// Move a file to trash. Trashing a trashed file is a no-op.
    pub async fn soft_delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let mut tx = self.store.begin().await?;
        let mut file = lookup::load_file(tx.as_mut(), ctx, file_id).await?;
        if file.is_removed {
            return Ok(file);
        }

        file.is_removed = true;
        let file = tx.update_file(&file).await?;
        tx.commit().await?;

        info!(owner_id = %ctx.owner_id, file_id = %file.id, "File moved to trash");
        Ok(file)
    }

    /// Restore a trashed file. Fails with `Conflict` while its folder is
    /// in trash.
    pub async fn recover_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let mut tx = self.store.begin().await?;
        let mut file = lookup::load_file(tx.as_mut(), ctx, file_id).await?;
        if !file.is_removed {
            return Ok(file);
        }
        if let Some(parent) = lookup::file_parent(tx.as_mut(), &file).await? {
            if parent.is_removed {
                return Err(AppError::conflict(format!(
                    "Cannot recover '{}' while '{}' is in trash",
                    file.name, parent.absolute_path
                )));
            }
        }

        file.is_removed = false;
        let file = tx.update_file(&file).await?;
        tx.commit().await?;

        info!(owner_id = %ctx.owner_id, file_id = %file.id, "File recovered");
        Ok(file)
    }

    /// Permanently delete a file and return its bytes to the drive.
    ///
    /// Returns the number of bytes freed; deleting an absent file frees
    /// nothing and succeeds.
    pub async fn hard_delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<i64> {
        let mut tx = self.store.begin().await?;
        let Some(file) = tx.find_file(file_id).await? else {
            debug!(file_id = %file_id, "File already deleted");
            return Ok(0);
        };
        if !ctx.owns(file.owner_id) {
            return Err(AppError::not_found(format!("File {file_id} not found")));
        }

        tx.delete_files(&[file.id]).await?;
        QuotaLedger::release_in(tx.as_mut(), file.drive_id, file.size_bytes).await?;
        tx.commit().await?;

        release_blobs(self.blobs.as_ref(), &[file.handle()]).await;

        info!(
            owner_id = %ctx.owner_id,
            file_id = %file.id,
            freed_bytes = file.size_bytes,
            "File permanently deleted"
        );
        Ok(file.size_bytes)
    }
}

/// Path of the folder holding `file`. Fails with `InvalidPath` when the
/// file is in trash, directly or through its folder.
async fn visible_parent_path(tx: &mut dyn StoreTransaction, file: &File) -> AppResult<String> {
    let parent = lookup::file_parent(tx, file).await?;
    let in_trash = file.is_removed || parent.as_ref().is_some_and(|p| p.is_removed);
    if in_trash {
        return Err(AppError::invalid_path(format!(
            "File '{}' is in trash",
            file.name
        )));
    }
    Ok(parent.map_or_else(|| HOME_PATH.to_string(), |p| p.absolute_path))
}
