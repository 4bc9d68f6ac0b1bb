//! Subtree rewrites shared by the folder operations.
//!
//! Descendants are always selected on a path-segment boundary, so a
//! sibling whose name merely extends the folder's name is never touched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::types::path;
use homedrive_database::StoreTransaction;
use homedrive_entity::folder::{Folder, RemovalState};

/// Row-lock every folder below `root` and return their latest state,
/// ordered by path. `root` itself must already be locked.
///
/// A writer that placed a child under a member before its lock was
/// granted has committed by then, so the subtree is re-read until every
/// member found is locked.
pub(crate) async fn lock_descendants(
    tx: &mut dyn StoreTransaction,
    root: &Folder,
) -> AppResult<Vec<Folder>> {
    let mut locked = HashSet::new();
    loop {
        let found = tx
            .find_descendant_folders(root.owner_id, &root.absolute_path)
            .await?;
        let pending: Vec<Uuid> = found
            .iter()
            .map(|f| f.id)
            .filter(|id| !locked.contains(id))
            .collect();
        if pending.is_empty() {
            return Ok(found);
        }
        // Rows that left the subtree before the lock was granted drop out
        // of the next read.
        for folder in tx.lock_folders(&pending).await? {
            if root.contains_path(&folder.absolute_path) {
                locked.insert(folder.id);
            }
        }
    }
}

/// Give `folder` a new parent, name, and path, and rebase every
/// descendant's path onto the new location. `folder` must be locked.
/// Returns the updated folder and the number of descendants rewritten.
pub(crate) async fn relocate_subtree(
    tx: &mut dyn StoreTransaction,
    folder: &Folder,
    new_parent_id: Option<Uuid>,
    new_name: &str,
    new_path: String,
    now: DateTime<Utc>,
) -> AppResult<(Folder, usize)> {
    let old_path = folder.absolute_path.clone();
    let descendants = lock_descendants(tx, folder).await?;

    let mut moved = folder.clone();
    moved.parent_id = new_parent_id;
    moved.name = new_name.to_string();
    moved.absolute_path = new_path;
    moved.modified_at = now;
    let moved = tx.update_folder(&moved).await?;

    for mut descendant in descendants.iter().cloned() {
        descendant.absolute_path = path::rebase(
            &descendant.absolute_path,
            &old_path,
            &moved.absolute_path,
        )
        .ok_or_else(|| {
            AppError::internal(format!(
                "Folder {} is not below '{old_path}'",
                descendant.id
            ))
        })?;
        tx.update_folder(&descendant).await?;
    }

    debug!(
        folder_id = %moved.id,
        from = %old_path,
        to = %moved.absolute_path,
        descendants = descendants.len(),
        "Subtree relocated"
    );
    Ok((moved, descendants.len()))
}

/// Descendants that become trashed along with their ancestor. Folders the
/// owner already trashed, and anything already hidden, keep their state.
pub(crate) fn trash_with_ancestor(descendants: &[Folder]) -> Vec<Folder> {
    descendants
        .iter()
        .filter(|f| f.removal_state() == RemovalState::Active)
        .cloned()
        .map(|mut f| {
            f.set_removal_state(RemovalState::TrashedWithAncestor);
            f
        })
        .collect()
}

/// Descendants restored when their ancestor is recovered.
///
/// `descendants` must be ordered by path. A descendant the owner trashed
/// independently stays in trash together with its whole subtree.
pub(crate) fn restore_with_ancestor(descendants: &[Folder]) -> Vec<Folder> {
    let mut kept_roots: Vec<&str> = Vec::new();
    let mut restored = Vec::new();

    for folder in descendants {
        if kept_roots
            .iter()
            .any(|root| path::is_strict_descendant(&folder.absolute_path, root))
        {
            continue;
        }
        match folder.removal_state() {
            RemovalState::Trashed => kept_roots.push(&folder.absolute_path),
            RemovalState::TrashedWithAncestor => {
                let mut folder = folder.clone();
                folder.set_removal_state(RemovalState::Active);
                restored.push(folder);
            }
            RemovalState::Active => {}
        }
    }
    restored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(path: &str, state: RemovalState) -> Folder {
        let now = Utc::now();
        let mut folder = Folder {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            drive_id: Uuid::nil(),
            parent_id: None,
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            absolute_path: path.to_string(),
            is_removed: false,
            is_removed_as_child: false,
            created_at: now,
            modified_at: now,
        };
        folder.set_removal_state(state);
        folder
    }

    fn paths(folders: &[Folder]) -> Vec<&str> {
        folders.iter().map(|f| f.absolute_path.as_str()).collect()
    }

    #[test]
    fn test_trash_skips_already_trashed() {
        let descendants = vec![
            folder("/home/A/B", RemovalState::Active),
            folder("/home/A/C", RemovalState::Trashed),
            folder("/home/A/C/D", RemovalState::TrashedWithAncestor),
        ];
        let flagged = trash_with_ancestor(&descendants);
        assert_eq!(paths(&flagged), vec!["/home/A/B"]);
        assert_eq!(flagged[0].removal_state(), RemovalState::TrashedWithAncestor);
    }

    #[test]
    fn test_restore_keeps_independently_trashed_subtrees() {
        let descendants = vec![
            folder("/home/A/B", RemovalState::TrashedWithAncestor),
            folder("/home/A/B/E", RemovalState::TrashedWithAncestor),
            folder("/home/A/C", RemovalState::Trashed),
            folder("/home/A/C/D", RemovalState::TrashedWithAncestor),
            folder("/home/A/CC", RemovalState::TrashedWithAncestor),
        ];
        let restored = restore_with_ancestor(&descendants);
        assert_eq!(paths(&restored), vec!["/home/A/B", "/home/A/B/E", "/home/A/CC"]);
        assert!(
            restored
                .iter()
                .all(|f| f.removal_state() == RemovalState::Active)
        );
    }
}
