//! Cascade Orchestrator: permanent deletion of a folder subtree.
//!
//! The subtree is discovered breadth-first by parent set, then destroyed
//! level by level starting from the deepest one. Each level is its own
//! unit of work: its files, the quota they held, bookmarks on its
//! folders, and the folders themselves go together. A folder row is only
//! deleted once nothing below it remains, so an interrupted delete leaves
//! a smaller but still connected subtree and re-running it from the same
//! folder id finishes the job.
//!
//! Each level's unit of work first locks the discovered subtree down to
//! that level and checks it is still connected. Concurrent moves or
//! uploads therefore either finish before the level is deleted, and
//! trigger a rediscovery, or wait until it is gone.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::{BlobHandle, BlobStore};
use homedrive_database::{DriveStore, StoreTransaction};

use crate::context::RequestContext;
use crate::drive::QuotaLedger;
use crate::lookup;

/// Discovery passes before giving up on a subtree that keeps gaining
/// children while it is being deleted.
const MAX_PASSES: usize = 8;

/// What a hard delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardDeleteReport {
    /// Folder rows deleted, including the target.
    pub folders_deleted: u64,
    /// File rows deleted.
    pub files_deleted: u64,
    /// Bookmarks removed.
    pub bookmarks_deleted: u64,
    /// Bytes returned to the drive quota.
    pub freed_bytes: i64,
    /// Blobs the backend failed to release.
    pub blobs_leaked: usize,
}

enum Sweep {
    Complete,
    TreeChanged,
}

/// Drives the level-by-level hard delete.
#[derive(Debug, Clone)]
pub struct CascadeOrchestrator {
    store: Arc<dyn DriveStore>,
    blobs: Arc<dyn BlobStore>,
}

impl CascadeOrchestrator {
    /// Creates a new cascade orchestrator.
    pub fn new(store: Arc<dyn DriveStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Permanently delete a folder and everything below it.
    ///
    /// Deleting a folder that no longer exists succeeds and reports
    /// nothing removed.
    pub async fn hard_delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        drive_id: Uuid,
    ) -> AppResult<HardDeleteReport> {
        let mut report = HardDeleteReport::default();

        for pass in 1..=MAX_PASSES {
            let Some(levels) = self.discover(ctx, folder_id, drive_id).await? else {
                debug!(folder_id = %folder_id, "Folder already deleted");
                return Ok(report);
            };
            debug!(folder_id = %folder_id, pass, depth = levels.len(), "Subtree discovered");

            match self.sweep(ctx, drive_id, &levels, &mut report).await? {
                Sweep::Complete => {
                    info!(
                        owner_id = %ctx.owner_id,
                        folder_id = %folder_id,
                        folders = report.folders_deleted,
                        files = report.files_deleted,
                        bookmarks = report.bookmarks_deleted,
                        freed_bytes = report.freed_bytes,
                        "Folder permanently deleted"
                    );
                    return Ok(report);
                }
                Sweep::TreeChanged => {
                    debug!(folder_id = %folder_id, pass, "Subtree changed during delete, rediscovering");
                }
            }
        }

        Err(AppError::conflict(format!(
            "Folder {folder_id} kept changing while being deleted"
        )))
    }

    /// Collect the subtree as levels of folder ids, the target alone in
    /// the first. `None` when the target is gone.
    async fn discover(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        drive_id: Uuid,
    ) -> AppResult<Option<Vec<Vec<Uuid>>>> {
        let mut tx = self.store.begin().await?;
        let Some(folder) = tx.find_folder(folder_id).await? else {
            return Ok(None);
        };
        if !ctx.owns(folder.owner_id) {
            return Err(AppError::not_found(format!("Folder {folder_id} not found")));
        }
        let drive = lookup::load_drive(tx.as_mut(), ctx, drive_id).await?;
        if folder.drive_id != drive.id {
            return Err(AppError::not_found(format!(
                "Folder {folder_id} not found on drive {drive_id}"
            )));
        }

        let mut seen = HashSet::from([folder_id]);
        let mut levels = vec![vec![folder_id]];
        loop {
            let frontier = levels.last().map(Vec::as_slice).unwrap_or_default();
            let next: Vec<Uuid> = tx
                .find_folders_by_parents(frontier)
                .await?
                .into_iter()
                .map(|f| f.id)
                .filter(|id| seen.insert(*id))
                .collect();
            if next.is_empty() {
                break;
            }
            levels.push(next);
        }
        Ok(Some(levels))
    }

    /// Destroy the discovered levels deepest first.
    async fn sweep(
        &self,
        ctx: &RequestContext,
        drive_id: Uuid,
        levels: &[Vec<Uuid>],
        report: &mut HardDeleteReport,
    ) -> AppResult<Sweep> {
        for (depth, level) in levels.iter().enumerate().rev() {
            let mut tx = self.store.begin().await?;

            if !still_attached(tx.as_mut(), &levels[..=depth]).await?
                || !tx.find_folders_by_parents(level).await?.is_empty()
            {
                return Ok(Sweep::TreeChanged);
            }

            let files = tx.find_files_by_parents(level).await?;
            let freed_bytes: i64 = files.iter().map(|f| f.size_bytes).sum();
            let file_ids: Vec<Uuid> = files.iter().map(|f| f.id).collect();
            let handles: Vec<BlobHandle> = files.iter().map(|f| f.handle()).collect();

            let files_deleted = if file_ids.is_empty() {
                0
            } else {
                tx.delete_files(&file_ids).await?
            };
            QuotaLedger::release_in(tx.as_mut(), drive_id, freed_bytes).await?;
            let bookmarks_deleted = tx.delete_bookmarks(ctx.owner_id, level).await?;
            let folders_deleted = tx.delete_folders(level).await?;
            tx.commit().await?;

            report.files_deleted += files_deleted;
            report.freed_bytes += freed_bytes;
            report.bookmarks_deleted += bookmarks_deleted;
            report.folders_deleted += folders_deleted;
            report.blobs_leaked += release_blobs(self.blobs.as_ref(), &handles).await;

            debug!(
                depth,
                folders = folders_deleted,
                files = files_deleted,
                freed_bytes,
                "Cascade level deleted"
            );
        }
        Ok(Sweep::Complete)
    }
}

/// Lock every folder of `levels` and check that each one still hangs off
/// a folder of the level above. A folder moved out of the subtree since
/// discovery, together with everything below it, is then left alone.
async fn still_attached(tx: &mut dyn StoreTransaction, levels: &[Vec<Uuid>]) -> AppResult<bool> {
    let ids: Vec<Uuid> = levels.iter().flatten().copied().collect();
    let parents: HashMap<Uuid, Option<Uuid>> = tx
        .lock_folders(&ids)
        .await?
        .into_iter()
        .map(|f| (f.id, f.parent_id))
        .collect();
    if parents.len() != ids.len() {
        return Ok(false);
    }

    Ok(levels.windows(2).all(|pair| {
        let above: HashSet<Uuid> = pair[0].iter().copied().collect();
        pair[1].iter().all(|id| {
            parents
                .get(id)
                .copied()
                .flatten()
                .is_some_and(|parent| above.contains(&parent))
        })
    }))
}

/// Release blobs whose records are already gone. Failures only leak
/// bytes in the backend, so they are logged and counted.
pub(crate) async fn release_blobs(blobs: &dyn BlobStore, handles: &[BlobHandle]) -> usize {
    let results = join_all(handles.iter().map(|handle| blobs.delete(handle))).await;
    let mut leaked = 0;
    for (handle, result) in handles.iter().zip(results) {
        if let Err(e) = result {
            warn!(%handle, error = %e, "Failed to release blob");
            leaked += 1;
        }
    }
    leaked
}
