//! References to tree nodes, including the virtual roots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::types::path::{HOME_PATH, TRASH_PATH};

/// A reference to a folder-like node: one of the virtual roots or a real
/// folder.
///
/// Serialized the way callers address parents: `"home"`, `"trash"`, or
/// a folder UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeRef {
    /// The virtual `/home` root.
    Home,
    /// The virtual `/trash` root.
    Trash,
    /// A persisted folder.
    Folder(Uuid),
}

impl NodeRef {
    /// Fixed path of a virtual root, `None` for real folders.
    pub fn virtual_path(&self) -> Option<&'static str> {
        match self {
            Self::Home => Some(HOME_PATH),
            Self::Trash => Some(TRASH_PATH),
            Self::Folder(_) => None,
        }
    }

    /// The `parent_id` a child of this node carries in the store.
    pub fn parent_id(&self) -> Option<Uuid> {
        match self {
            Self::Folder(id) => Some(*id),
            Self::Home | Self::Trash => None,
        }
    }

    /// Inverse of [`NodeRef::parent_id`] for nodes living in the home tree.
    pub fn from_parent_id(parent_id: Option<Uuid>) -> Self {
        parent_id.map_or(Self::Home, Self::Folder)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::Trash => f.write_str("trash"),
            Self::Folder(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for NodeRef {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "trash" => Ok(Self::Trash),
            other => Uuid::parse_str(other)
                .map(Self::Folder)
                .map_err(|_| AppError::not_found(format!("Folder '{other}' not found"))),
        }
    }
}

impl TryFrom<String> for NodeRef {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeRef> for String {
    fn from(node: NodeRef) -> Self {
        node.to_string()
    }
}
