//! Folder bookmarks.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_database::DriveStore;
use homedrive_entity::bookmark::{Bookmark, BookmarkEntry};

use crate::context::RequestContext;
use crate::lookup;

/// Manages an owner's pinned folders.
#[derive(Debug, Clone)]
pub struct BookmarkService {
    store: Arc<dyn DriveStore>,
}

impl BookmarkService {
    /// Creates a new bookmark service.
    pub fn new(store: Arc<dyn DriveStore>) -> Self {
        Self { store }
    }

    /// Pin a folder that is not in trash.
    pub async fn add_bookmark(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Bookmark> {
        let mut tx = self.store.begin().await?;
        let folder = lookup::lock_folder(tx.as_mut(), ctx, folder_id).await?;
        if folder.is_removed {
            return Err(AppError::not_found(format!("Folder {folder_id} is in trash")));
        }
        let bookmark = tx.insert_bookmark(ctx.owner_id, folder.id).await?;
        tx.commit().await?;

        info!(owner_id = %ctx.owner_id, folder_id = %folder_id, "Bookmark added");
        Ok(bookmark)
    }

    /// Unpin a folder. Returns whether a bookmark existed.
    pub async fn remove_bookmark(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        let removed = tx.delete_bookmarks(ctx.owner_id, &[folder_id]).await?;
        tx.commit().await?;

        if removed > 0 {
            info!(owner_id = %ctx.owner_id, folder_id = %folder_id, "Bookmark removed");
        }
        Ok(removed > 0)
    }

    /// The caller's bookmarks with their folders, newest first. Bookmarks
    /// on trashed folders are left out.
    pub async fn list_bookmarks(&self, ctx: &RequestContext) -> AppResult<Vec<BookmarkEntry>> {
        let mut tx = self.store.begin().await?;
        let bookmarks = tx.find_bookmarks(ctx.owner_id).await?;

        let mut entries = Vec::with_capacity(bookmarks.len());
        for bookmark in bookmarks {
            if let Some(folder) = tx.find_folder(bookmark.folder_id).await? {
                if !folder.is_removed {
                    entries.push(BookmarkEntry { bookmark, folder });
                }
            }
        }
        Ok(entries)
    }
}
