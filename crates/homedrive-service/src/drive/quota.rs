//! Quota Ledger: admission control over a drive's byte counters.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use homedrive_core::error::AppError;
use homedrive_core::result::AppResult;
use homedrive_database::{DriveStore, StoreTransaction};
use homedrive_entity::drive::DriveQuota;

use crate::context::RequestContext;
use crate::lookup;

/// Tracks `space_used` against `space_total` per drive.
///
/// Reservations are a single compare-and-increment in the store, so two
/// concurrent writers can never both pass the capacity check.
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    store: Arc<dyn DriveStore>,
}

impl QuotaLedger {
    /// Creates a new quota ledger.
    pub fn new(store: Arc<dyn DriveStore>) -> Self {
        Self { store }
    }

    /// Admit `bytes` more on the caller's drive in its own unit of work.
    /// Returns `false` (and changes nothing) when the quota would be
    /// exceeded.
    pub async fn reserve(&self, ctx: &RequestContext, drive_id: Uuid, bytes: i64) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        lookup::load_drive(tx.as_mut(), ctx, drive_id).await?;
        let admitted = Self::reserve_in(tx.as_mut(), drive_id, bytes).await?;
        if admitted {
            tx.commit().await?;
            info!(drive_id = %drive_id, bytes, "Reserved drive space");
        }
        Ok(admitted)
    }

    /// Give back `bytes` on the caller's drive, floored at zero.
    pub async fn release(&self, ctx: &RequestContext, drive_id: Uuid, bytes: i64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        lookup::load_drive(tx.as_mut(), ctx, drive_id).await?;
        Self::release_in(tx.as_mut(), drive_id, bytes).await?;
        tx.commit().await?;
        info!(drive_id = %drive_id, bytes, "Released drive space");
        Ok(())
    }

    /// Current usage of the caller's drive.
    pub async fn usage(&self, ctx: &RequestContext, drive_id: Uuid) -> AppResult<DriveQuota> {
        let mut tx = self.store.begin().await?;
        Ok(lookup::load_drive(tx.as_mut(), ctx, drive_id).await?.quota())
    }

    pub(crate) async fn reserve_in(
        tx: &mut dyn StoreTransaction,
        drive_id: Uuid,
        bytes: i64,
    ) -> AppResult<bool> {
        if bytes < 0 {
            return Err(AppError::internal(format!("Cannot reserve {bytes} bytes")));
        }
        let reserved = tx.reserve_space(drive_id, bytes).await?;
        match &reserved {
            Some(drive) => {
                debug!(drive_id = %drive_id, bytes, space_used = drive.space_used, "Quota reserved")
            }
            None => debug!(drive_id = %drive_id, bytes, "Quota refused"),
        }
        Ok(reserved.is_some())
    }

    pub(crate) async fn release_in(
        tx: &mut dyn StoreTransaction,
        drive_id: Uuid,
        bytes: i64,
    ) -> AppResult<()> {
        if bytes < 0 {
            return Err(AppError::internal(format!("Cannot release {bytes} bytes")));
        }
        if bytes == 0 {
            return Ok(());
        }
        let drive = tx
            .release_space(drive_id, bytes)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Drive {drive_id} not found")))?;
        debug!(drive_id = %drive_id, bytes, space_used = drive.space_used, "Quota released");
        Ok(())
    }
}
