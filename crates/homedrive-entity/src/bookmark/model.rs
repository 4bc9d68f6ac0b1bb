//! Bookmark entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::folder::Folder;

/// A user-to-folder pin, keyed by `(owner_id, folder_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Bookmark {
    /// The user who pinned the folder.
    pub owner_id: Uuid,
    /// The pinned folder.
    pub folder_id: Uuid,
    /// When the bookmark was created.
    pub created_at: DateTime<Utc>,
}

/// A bookmark joined with the folder it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkEntry {
    /// The bookmark row.
    pub bookmark: Bookmark,
    /// The pinned folder.
    pub folder: Folder,
}
