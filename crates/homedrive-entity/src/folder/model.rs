//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use homedrive_core::types::path;

/// Trash state of a folder.
///
/// A folder trashed directly by its owner and a folder trashed only
/// because an ancestor was trashed are distinct: recovering the ancestor
/// restores the latter but never the former.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalState {
    /// Visible in the home tree.
    Active,
    /// Trashed directly; listed at the top level of trash.
    Trashed,
    /// Trashed as a side effect of an ancestor being trashed.
    TrashedWithAncestor,
}

impl RemovalState {
    /// Decode the pair of persisted flags.
    pub fn from_flags(is_removed: bool, is_removed_as_child: bool) -> Self {
        match (is_removed, is_removed_as_child) {
            (false, _) => Self::Active,
            (true, false) => Self::Trashed,
            (true, true) => Self::TrashedWithAncestor,
        }
    }

    /// Encode into `(is_removed, is_removed_as_child)`.
    pub fn flags(self) -> (bool, bool) {
        match self {
            Self::Active => (false, false),
            Self::Trashed => (true, false),
            Self::TrashedWithAncestor => (true, true),
        }
    }
}

/// A folder in an owner's drive.
///
/// For every folder, `absolute_path == parent.absolute_path + "/" + name`,
/// where a `None` parent stands for the virtual home root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The folder owner.
    pub owner_id: Uuid,
    /// The drive this folder belongs to.
    pub drive_id: Uuid,
    /// Parent folder ID (`None` means attached to `/home`).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Materialized absolute path (e.g. `/home/documents/reports`).
    pub absolute_path: String,
    /// Whether the folder is in trash.
    pub is_removed: bool,
    /// Whether the folder is in trash only because an ancestor is.
    pub is_removed_as_child: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last renamed or moved.
    pub modified_at: DateTime<Utc>,
}

impl Folder {
    /// Current trash state.
    pub fn removal_state(&self) -> RemovalState {
        RemovalState::from_flags(self.is_removed, self.is_removed_as_child)
    }

    /// Overwrite the trash flags with the given state.
    pub fn set_removal_state(&mut self, state: RemovalState) {
        (self.is_removed, self.is_removed_as_child) = state.flags();
    }

    /// Whether `other` lies strictly inside this folder's subtree.
    pub fn contains_path(&self, other: &str) -> bool {
        path::is_strict_descendant(other, &self.absolute_path)
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The folder owner.
    pub owner_id: Uuid,
    /// The drive.
    pub drive_id: Uuid,
    /// Parent folder (`None` for the home root).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Full materialized path.
    pub absolute_path: String,
}
