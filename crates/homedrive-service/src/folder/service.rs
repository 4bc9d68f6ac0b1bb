//! Folder create, rename, move, and trash operations.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use homedrive_core::config::DriveConfig;
use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::types::path::{self, HOME_PATH};
use homedrive_database::DriveStore;
use homedrive_entity::folder::{CreateFolder, Folder, RemovalState};
use homedrive_entity::node::NodeRef;

use super::tree;
use crate::context::RequestContext;
use crate::lookup;
use crate::path::PathResolver;

/// Tree Mutator for folders.
///
/// Every operation runs in a single unit of work, so a folder and its
/// rewritten descendants become visible together or not at all.
#[derive(Debug, Clone)]
pub struct FolderService {
    store: Arc<dyn DriveStore>,
    config: DriveConfig,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(store: Arc<dyn DriveStore>, config: DriveConfig) -> Self {
        Self { store, config }
    }

    /// Create a folder named `name` under `parent` on the caller's drive.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        drive_id: Uuid,
        parent: NodeRef,
        name: &str,
    ) -> AppResult<Folder> {
        path::validate_name(name, self.config.max_name_length)?;

        let mut tx = self.store.begin().await?;
        let drive = lookup::load_drive(tx.as_mut(), ctx, drive_id).await?;
        let parent = PathResolver::writable_parent_in(tx.as_mut(), ctx, parent).await?;
        lookup::ensure_name_free(
            tx.as_mut(),
            ctx.owner_id,
            parent.parent_id(),
            &parent.absolute_path,
            name,
            None,
        )
        .await?;

        let folder = tx
            .insert_folder(&CreateFolder {
                owner_id: ctx.owner_id,
                drive_id: drive.id,
                parent_id: parent.parent_id(),
                name: name.to_string(),
                absolute_path: path::join(&parent.absolute_path, name),
            })
            .await?;
        tx.commit().await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %folder.id,
            path = %folder.absolute_path,
            "Folder created"
        );
        Ok(folder)
    }

    /// Rename a folder and rewrite the paths of its whole subtree.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        path::validate_name(new_name, self.config.max_name_length)?;

        let mut tx = self.store.begin().await?;
        let folder = lookup::lock_folder(tx.as_mut(), ctx, folder_id).await?;
        ensure_not_trashed(&folder)?;
        if folder.name == new_name {
            return Ok(folder);
        }

        let new_path = path::with_name(&folder.absolute_path, new_name);
        let parent_path = folder
            .absolute_path
            .rsplit_once(path::SEPARATOR)
            .map_or(HOME_PATH, |(parent, _)| parent);
        lookup::ensure_name_free(
            tx.as_mut(),
            ctx.owner_id,
            folder.parent_id,
            parent_path,
            new_name,
            Some(folder.id),
        )
        .await?;

        let (renamed, descendants) = tree::relocate_subtree(
            tx.as_mut(),
            &folder,
            folder.parent_id,
            new_name,
            new_path,
            Utc::now(),
        )
        .await?;
        tx.commit().await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %renamed.id,
            from = %folder.absolute_path,
            to = %renamed.absolute_path,
            descendants,
            "Folder renamed"
        );
        Ok(renamed)
    }

    /// Move a folder under `destination`, rewriting the paths of its whole
    /// subtree. Moving a folder into itself or one of its descendants
    /// fails with `CycleRejected`.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        destination: NodeRef,
    ) -> AppResult<Folder> {
        let mut tx = self.store.begin().await?;
        if let NodeRef::Folder(destination_id) = destination {
            // Both rows in one ID-ordered lock.
            tx.lock_folders(&[folder_id, destination_id]).await?;
        }
        let folder = lookup::lock_folder(tx.as_mut(), ctx, folder_id).await?;
        ensure_not_trashed(&folder)?;
        if destination == NodeRef::Folder(folder.id) {
            return Err(AppError::cycle_rejected(format!(
                "Cannot move '{}' into itself",
                folder.absolute_path
            )));
        }

        let target = PathResolver::writable_parent_in(tx.as_mut(), ctx, destination).await?;
        if folder.contains_path(&target.absolute_path) {
            return Err(AppError::cycle_rejected(format!(
                "Cannot move '{}' into its own descendant '{}'",
                folder.absolute_path, target.absolute_path
            )));
        }
        if target.parent_id() == folder.parent_id {
            return Ok(folder);
        }

        lookup::ensure_name_free(
            tx.as_mut(),
            ctx.owner_id,
            target.parent_id(),
            &target.absolute_path,
            &folder.name,
            Some(folder.id),
        )
        .await?;

        let new_path = path::join(&target.absolute_path, &folder.name);
        let (moved, descendants) = tree::relocate_subtree(
            tx.as_mut(),
            &folder,
            target.parent_id(),
            &folder.name,
            new_path,
            Utc::now(),
        )
        .await?;
        tx.commit().await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %moved.id,
            from = %folder.absolute_path,
            to = %moved.absolute_path,
            descendants,
            "Folder moved"
        );
        Ok(moved)
    }

    /// Move a folder to trash. Its active descendants are trashed with it;
    /// descendants already in trash keep their own state.
    pub async fn soft_delete_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        let mut tx = self.store.begin().await?;
        let mut folder = lookup::lock_folder(tx.as_mut(), ctx, folder_id).await?;
        if folder.removal_state() != RemovalState::Active {
            return Ok(folder);
        }

        let descendants = tree::lock_descendants(tx.as_mut(), &folder).await?;
        folder.set_removal_state(RemovalState::Trashed);
        let folder = tx.update_folder(&folder).await?;
        let flagged = tree::trash_with_ancestor(&descendants);
        for descendant in &flagged {
            tx.update_folder(descendant).await?;
        }
        tx.commit().await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %folder.id,
            path = %folder.absolute_path,
            descendants = flagged.len(),
            "Folder moved to trash"
        );
        Ok(folder)
    }

    /// Restore a trashed folder and the descendants trashed along with it.
    ///
    /// Fails with `Conflict` while an ancestor is still in trash.
    pub async fn recover_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        let mut tx = self.store.begin().await?;
        let mut folder = lookup::lock_folder(tx.as_mut(), ctx, folder_id).await?;
        match folder.removal_state() {
            RemovalState::Active => return Ok(folder),
            RemovalState::TrashedWithAncestor => {
                return Err(AppError::conflict(format!(
                    "Folder '{}' is in trash with its ancestor; recover the ancestor instead",
                    folder.absolute_path
                )));
            }
            RemovalState::Trashed => {}
        }
        if let Some(parent_id) = folder.parent_id {
            let parent = lookup::lock_folder(tx.as_mut(), ctx, parent_id).await?;
            if parent.is_removed {
                return Err(AppError::conflict(format!(
                    "Cannot recover '{}' while '{}' is in trash",
                    folder.absolute_path, parent.absolute_path
                )));
            }
        }

        let descendants = tree::lock_descendants(tx.as_mut(), &folder).await?;
        folder.set_removal_state(RemovalState::Active);
        let folder = tx.update_folder(&folder).await?;
        let restored = tree::restore_with_ancestor(&descendants);
        for descendant in &restored {
            tx.update_folder(descendant).await?;
        }
        tx.commit().await?;

        info!(
            owner_id = %ctx.owner_id,
            folder_id = %folder.id,
            path = %folder.absolute_path,
            descendants = restored.len(),
            "Folder recovered"
        );
        Ok(folder)
    }
}

fn ensure_not_trashed(folder: &Folder) -> AppResult<()> {
    if folder.is_removed {
        return Err(AppError::invalid_path(format!(
            "Folder '{}' is in trash",
            folder.absolute_path
        )));
    }
    Ok(())
}
