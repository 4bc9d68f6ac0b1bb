//! Directory and trash listings.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::types::path::{HOME_PATH, TRASH_PATH};
use homedrive_database::DriveStore;
use homedrive_entity::file::FileEntry;
use homedrive_entity::node::{DirectoryListing, NodeRef};

use crate::context::RequestContext;
use crate::path::PathResolver;

/// Builds listings of the home tree and of trash.
#[derive(Debug, Clone)]
pub struct ListingService {
    store: Arc<dyn DriveStore>,
}

impl ListingService {
    /// Creates a new listing service.
    pub fn new(store: Arc<dyn DriveStore>) -> Self {
        Self { store }
    }

    /// Active children of `home` or of a folder. Listing `trash` returns
    /// the trash listing.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        node: NodeRef,
    ) -> AppResult<DirectoryListing> {
        if node == NodeRef::Trash {
            return self.list_trash(ctx).await;
        }

        let mut tx = self.store.begin().await?;
        let parent = PathResolver::parent_context_in(tx.as_mut(), ctx, node).await?;
        if parent.folder.as_ref().is_some_and(|f| f.is_removed) {
            return Err(AppError::not_found(format!(
                "Folder '{}' is in trash",
                parent.absolute_path
            )));
        }

        let folders = tx
            .find_child_folders(ctx.owner_id, parent.parent_id())
            .await?
            .into_iter()
            .filter(|f| !f.is_removed)
            .collect();
        let files = tx
            .find_child_files(ctx.owner_id, parent.parent_id())
            .await?
            .into_iter()
            .filter(|f| !f.is_removed)
            .map(|f| FileEntry::new(f, &parent.absolute_path))
            .collect();

        Ok(DirectoryListing {
            node,
            absolute_path: parent.absolute_path,
            folders,
            files,
        })
    }

    /// Top-level trash: folders trashed directly and trashed files, each
    /// sorted by name and shown at the path they were trashed from.
    pub async fn list_trash(&self, ctx: &RequestContext) -> AppResult<DirectoryListing> {
        let mut tx = self.store.begin().await?;
        let folders = tx.find_trashed_folders(ctx.owner_id).await?;
        let trashed_files = tx.find_trashed_files(ctx.owner_id).await?;

        let mut parent_paths: HashMap<Uuid, String> = HashMap::new();
        let mut files = Vec::with_capacity(trashed_files.len());
        for file in trashed_files {
            let parent_path = match file.parent_id {
                None => HOME_PATH.to_string(),
                Some(parent_id) => match parent_paths.get(&parent_id) {
                    Some(known) => known.clone(),
                    None => {
                        let resolved = tx
                            .find_folder(parent_id)
                            .await?
                            .map_or_else(|| TRASH_PATH.to_string(), |p| p.absolute_path);
                        parent_paths.insert(parent_id, resolved.clone());
                        resolved
                    }
                },
            };
            files.push(FileEntry::new(file, &parent_path));
        }

        Ok(DirectoryListing {
            node: NodeRef::Trash,
            absolute_path: TRASH_PATH.to_string(),
            folders,
            files,
        })
    }
}
