//! Drive provisioning and lookup.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use homedrive_core::config::DriveConfig;
use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_database::DriveStore;
use homedrive_entity::drive::{CreateDrive, Drive};

use crate::context::RequestContext;

/// Manages the one drive each owner has.
#[derive(Debug, Clone)]
pub struct DriveService {
    store: Arc<dyn DriveStore>,
    config: DriveConfig,
}

impl DriveService {
    /// Creates a new drive service.
    pub fn new(store: Arc<dyn DriveStore>, config: DriveConfig) -> Self {
        Self { store, config }
    }

    /// Create the drive for a newly registered owner with the configured
    /// initial quota.
    pub async fn provision_drive(&self, owner_id: Uuid) -> AppResult<Drive> {
        let mut tx = self.store.begin().await?;
        let drive = tx
            .insert_drive(&CreateDrive {
                owner_id,
                space_total: self.config.initial_quota_bytes,
            })
            .await?;
        tx.commit().await?;

        info!(
            owner_id = %owner_id,
            drive_id = %drive.id,
            space_total = drive.space_total,
            "Drive provisioned"
        );
        Ok(drive)
    }

    /// The caller's drive.
    pub async fn get_drive(&self, ctx: &RequestContext) -> AppResult<Drive> {
        let mut tx = self.store.begin().await?;
        tx.find_drive_by_owner(ctx.owner_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Owner {} has no drive", ctx.owner_id)))
    }
}
