//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use homedrive_core::traits::storage::BlobHandle;
use homedrive_core::types::path;

/// A file stored in a drive.
///
/// Files carry no materialized path; their effective path is the parent
/// folder's path plus the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// The drive whose quota accounts for this file.
    pub drive_id: Uuid,
    /// The folder containing this file (`None` means `/home`).
    pub parent_id: Option<Uuid>,
    /// The file name (including extension).
    pub name: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// Blob backend handle of the content.
    pub storage_handle: String,
    /// Whether the file is in trash.
    pub is_removed: bool,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
    /// When the file was last renamed or moved.
    pub modified_at: DateTime<Utc>,
}

impl File {
    /// Blob handle of the content.
    pub fn handle(&self) -> BlobHandle {
        BlobHandle::new(self.storage_handle.clone())
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The file owner.
    pub owner_id: Uuid,
    /// The drive.
    pub drive_id: Uuid,
    /// The folder to place the file in.
    pub parent_id: Option<Uuid>,
    /// The file name.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// Blob backend handle.
    pub storage_handle: String,
}

/// A file together with its effective absolute path, as exposed in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// The file record.
    #[serde(flatten)]
    pub file: File,
    /// `parent path + "/" + name`.
    pub absolute_path: String,
}

impl FileEntry {
    /// Pair a file with the absolute path of its parent.
    pub fn new(file: File, parent_path: &str) -> Self {
        let absolute_path = path::join(parent_path, &file.name);
        Self {
            file,
            absolute_path,
        }
    }
}
