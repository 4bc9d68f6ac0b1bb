//! Drive entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::quota::DriveQuota;

/// A per-owner storage container with a fixed byte quota.
///
/// `0 <= space_used <= space_total` holds after every committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Drive {
    /// Unique drive identifier.
    pub id: Uuid,
    /// The owning user.
    pub owner_id: Uuid,
    /// Total quota in bytes.
    pub space_total: i64,
    /// Bytes currently accounted to files on this drive.
    pub space_used: i64,
    /// When the drive was provisioned.
    pub created_at: DateTime<Utc>,
}

impl Drive {
    /// Quota view of this drive.
    pub fn quota(&self) -> DriveQuota {
        DriveQuota::new(self.space_total, self.space_used)
    }

    /// Whether `additional_bytes` more would still fit.
    pub fn can_admit(&self, additional_bytes: i64) -> bool {
        !self.quota().would_exceed(additional_bytes)
    }
}

/// Data required to provision a drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDrive {
    /// The owning user.
    pub owner_id: Uuid,
    /// Total quota in bytes.
    pub space_total: i64,
}
