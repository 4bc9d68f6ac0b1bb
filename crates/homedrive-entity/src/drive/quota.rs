//! Drive quota value object.

use serde::{Deserialize, Serialize};

/// Quota information for a drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveQuota {
    /// Total quota in bytes.
    pub total_bytes: i64,
    /// Currently used bytes.
    pub used_bytes: i64,
    /// Available bytes.
    pub available_bytes: i64,
    /// Usage percentage (0.0 - 100.0).
    pub usage_percent: f64,
}

impl DriveQuota {
    /// Create a quota from total and used values.
    pub fn new(total_bytes: i64, used_bytes: i64) -> Self {
        let usage_percent = if total_bytes == 0 {
            0.0
        } else {
            (used_bytes as f64 / total_bytes as f64) * 100.0
        };

        Self {
            total_bytes,
            used_bytes,
            available_bytes: (total_bytes - used_bytes).max(0),
            usage_percent,
        }
    }

    /// Check if the quota is fully consumed.
    pub fn is_full(&self) -> bool {
        self.used_bytes >= self.total_bytes
    }

    /// Check if adding the given number of bytes would exceed the quota.
    pub fn would_exceed(&self, additional_bytes: i64) -> bool {
        self.used_bytes.saturating_add(additional_bytes) > self.total_bytes
    }
}
