//! File creation: blob placement plus quota-checked record insert.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use homedrive_core::config::DriveConfig;
use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_core::traits::storage::{BlobHandle, BlobStore};
use homedrive_core::types::path;
use homedrive_database::{DriveStore, StoreTransaction};
use homedrive_entity::file::{CreateFile, File};
use homedrive_entity::node::NodeRef;

use crate::context::RequestContext;
use crate::drive::QuotaLedger;
use crate::folder::cascade::release_blobs;
use crate::lookup;
use crate::path::{ParentContext, PathResolver};

/// Places new files into the tree.
#[derive(Debug, Clone)]
pub struct UploadService {
    store: Arc<dyn DriveStore>,
    blobs: Arc<dyn BlobStore>,
    config: DriveConfig,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(store: Arc<dyn DriveStore>, blobs: Arc<dyn BlobStore>, config: DriveConfig) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    /// Store `data` as a file named `name` under `parent`.
    ///
    /// The blob is written first; its measured size is then reserved on
    /// the drive and the record inserted in one unit of work. If that
    /// unit of work fails the blob is released again.
    pub async fn create_file(
        &self,
        ctx: &RequestContext,
        drive_id: Uuid,
        parent: NodeRef,
        name: &str,
        data: Bytes,
    ) -> AppResult<File> {
        path::validate_name(name, self.config.max_name_length)?;
        let declared = i64::try_from(data.len())
            .map_err(|_| AppError::quota_exceeded("File is too large"))?;

        // Cheap rejection before any bytes reach the backend.
        {
            let mut tx = self.store.begin().await?;
            let drive = lookup::load_drive(tx.as_mut(), ctx, drive_id).await?;
            check_target(tx.as_mut(), ctx, parent, name).await?;
            if !drive.can_admit(declared) {
                return Err(quota_exceeded(declared));
            }
        }

        let handle = self.blobs.write(data).await?;
        match self.admit(ctx, drive_id, parent, name, &handle).await {
            Ok(file) => {
                info!(
                    owner_id = %ctx.owner_id,
                    file_id = %file.id,
                    parent = %parent,
                    name = %file.name,
                    size_bytes = file.size_bytes,
                    "File created"
                );
                Ok(file)
            }
            Err(e) => {
                release_blobs(self.blobs.as_ref(), std::slice::from_ref(&handle)).await;
                Err(e)
            }
        }
    }

    async fn admit(
        &self,
        ctx: &RequestContext,
        drive_id: Uuid,
        parent: NodeRef,
        name: &str,
        handle: &BlobHandle,
    ) -> AppResult<File> {
        let size = self.blobs.size(handle).await?;
        let size_bytes =
            i64::try_from(size).map_err(|_| AppError::quota_exceeded("File is too large"))?;

        let mut tx = self.store.begin().await?;
        lookup::load_drive(tx.as_mut(), ctx, drive_id).await?;
        let target = check_target(tx.as_mut(), ctx, parent, name).await?;
        if !QuotaLedger::reserve_in(tx.as_mut(), drive_id, size_bytes).await? {
            return Err(quota_exceeded(size_bytes));
        }

        let file = tx
            .insert_file(&CreateFile {
                owner_id: ctx.owner_id,
                drive_id,
                parent_id: target.parent_id(),
                name: name.to_string(),
                size_bytes,
                storage_handle: handle.as_str().to_string(),
            })
            .await?;
        tx.commit().await?;
        Ok(file)
    }
}

async fn check_target(
    tx: &mut dyn StoreTransaction,
    ctx: &RequestContext,
    parent: NodeRef,
    name: &str,
) -> AppResult<ParentContext> {
    let target = PathResolver::writable_parent_in(tx, ctx, parent).await?;
    lookup::ensure_name_free(
        tx,
        ctx.owner_id,
        target.parent_id(),
        &target.absolute_path,
        name,
        None,
    )
    .await?;
    Ok(target)
}

fn quota_exceeded(bytes: i64) -> AppError {
    AppError::quota_exceeded(format!("Storing {bytes} bytes would exceed the drive quota"))
}
