//! Drive quota and naming configuration.

use serde::{Deserialize, Serialize};

/// Per-drive defaults applied at provisioning time and name rules
/// enforced by the tree mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Quota assigned to a freshly provisioned drive (default 100 MiB).
    #[serde(default = "default_initial_quota")]
    pub initial_quota_bytes: i64,
    /// Maximum length of a folder or file name, in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            initial_quota_bytes: default_initial_quota(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_initial_quota() -> i64 {
    104_857_600 // 100 MiB
}

fn default_max_name_length() -> usize {
    255
}
