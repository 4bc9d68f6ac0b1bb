//! Maps absolute paths and parent references onto tree nodes.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::types::path::{self, HOME_PATH, TRASH_PATH};
use homedrive_database::{DriveStore, StoreTransaction};
use homedrive_entity::folder::Folder;
use homedrive_entity::node::NodeRef;

use crate::context::RequestContext;
use crate::lookup;

/// A resolved parent: the node, its backing folder (absent for the virtual
/// roots), and its absolute path.
#[derive(Debug, Clone)]
pub struct ParentContext {
    /// The referenced node.
    pub node: NodeRef,
    /// The folder record, `None` for `home` and `trash`.
    pub folder: Option<Folder>,
    /// Absolute path of the node.
    pub absolute_path: String,
}

impl ParentContext {
    /// The `parent_id` carried by children of this node.
    pub fn parent_id(&self) -> Option<Uuid> {
        self.node.parent_id()
    }
}

/// Path Resolver.
#[derive(Debug, Clone)]
pub struct PathResolver {
    store: Arc<dyn DriveStore>,
}

impl PathResolver {
    /// Creates a new path resolver.
    pub fn new(store: Arc<dyn DriveStore>) -> Self {
        Self { store }
    }

    /// Resolve an absolute path to a node.
    ///
    /// `/home` and `/trash` resolve without touching the store. Every other
    /// path must lie under `/home`; trashed folders are not addressable.
    pub async fn resolve_path(&self, ctx: &RequestContext, raw_path: &str) -> AppResult<NodeRef> {
        let target = normalize(raw_path);
        match target {
            HOME_PATH => return Ok(NodeRef::Home),
            TRASH_PATH => return Ok(NodeRef::Trash),
            _ => {}
        }
        if !path::is_addressable(target) {
            return Err(AppError::invalid_path(format!(
                "Path '{raw_path}' is not addressable"
            )));
        }

        let mut tx = self.store.begin().await?;
        let folder = tx
            .find_folder_by_path(ctx.owner_id, target)
            .await?
            .filter(|f| !f.is_removed)
            .ok_or_else(|| AppError::not_found(format!("Path '{target}' not found")))?;

        debug!(owner_id = %ctx.owner_id, path = target, folder_id = %folder.id, "Resolved path");
        Ok(NodeRef::Folder(folder.id))
    }

    /// Resolve a parent reference to its absolute path.
    pub async fn resolve_parent_context(
        &self,
        ctx: &RequestContext,
        node: NodeRef,
    ) -> AppResult<ParentContext> {
        let mut tx = self.store.begin().await?;
        Self::parent_context_in(tx.as_mut(), ctx, node).await
    }

    /// Absolute path of a node.
    pub async fn resolve_folder_path(&self, ctx: &RequestContext, node: NodeRef) -> AppResult<String> {
        Ok(self.resolve_parent_context(ctx, node).await?.absolute_path)
    }

    pub(crate) async fn parent_context_in(
        tx: &mut dyn StoreTransaction,
        ctx: &RequestContext,
        node: NodeRef,
    ) -> AppResult<ParentContext> {
        match node {
            NodeRef::Home | NodeRef::Trash => Ok(ParentContext {
                node,
                folder: None,
                absolute_path: node.virtual_path().unwrap_or(HOME_PATH).to_string(),
            }),
            NodeRef::Folder(id) => {
                let folder = lookup::load_folder(tx, ctx, id).await?;
                Ok(ParentContext {
                    node,
                    absolute_path: folder.absolute_path.clone(),
                    folder: Some(folder),
                })
            }
        }
    }

    /// Resolve a parent that may receive new children: `home` or a folder
    /// that is not in trash. A folder parent stays row-locked until the
    /// unit of work ends, so it cannot be renamed or deleted underneath
    /// the new child.
    pub(crate) async fn writable_parent_in(
        tx: &mut dyn StoreTransaction,
        ctx: &RequestContext,
        node: NodeRef,
    ) -> AppResult<ParentContext> {
        let parent = match node {
            NodeRef::Folder(id) => {
                let folder = lookup::lock_folder(tx, ctx, id).await?;
                ParentContext {
                    node,
                    absolute_path: folder.absolute_path.clone(),
                    folder: Some(folder),
                }
            }
            NodeRef::Home | NodeRef::Trash => Self::parent_context_in(tx, ctx, node).await?,
        };
        let in_trash = match &parent.folder {
            Some(folder) => folder.is_removed,
            None => parent.node == NodeRef::Trash,
        };
        if in_trash {
            return Err(AppError::invalid_path(format!(
                "Cannot place nodes under '{}': it is in trash",
                parent.absolute_path
            )));
        }
        Ok(parent)
    }
}

/// Strip a single trailing separator (`/home/A/` addresses `/home/A`).
fn normalize(raw: &str) -> &str {
    match raw.strip_suffix(path::SEPARATOR) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => raw,
    }
}
