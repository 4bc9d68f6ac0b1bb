//! Directory listings returned to callers.

use serde::{Deserialize, Serialize};

use super::reference::NodeRef;
use crate::file::FileEntry;
use crate::folder::Folder;

/// The children of a node, each group sorted by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// The listed node.
    pub node: NodeRef,
    /// Absolute path of the listed node.
    pub absolute_path: String,
    /// Child folders.
    pub folders: Vec<Folder>,
    /// Child files with their effective paths.
    pub files: Vec<FileEntry>,
}

impl DirectoryListing {
    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    /// Whether the listing has no entries.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}
