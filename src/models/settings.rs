//! Process-wide settings record
//!
//! Read-only to the core components; replaced as a whole through
//! [`crate::config::SettingsStore::update`].

use serde::{Deserialize, Serialize};

/// User-configured thresholds, persisted as a single record
///
/// Thresholds are on the normalized display scale the analyzer emits
/// (dBFS + 100, floored at 40), not raw dBFS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Items whose average loudness falls below this are flagged
    pub min_db_threshold: f64,
    /// Items whose peak loudness rises above this are flagged
    pub max_db_threshold: f64,
    /// Imports larger than this are flagged (not rejected)
    pub max_file_size_mb: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_db_threshold: 80.0, // -20 dBFS on the normalized scale
            max_db_threshold: 94.0, // -6 dBFS on the normalized scale
            max_file_size_mb: 5.0,
        }
    }
}

impl Settings {
    /// Size-limit check applied at import time
    pub fn size_exceeded(&self, byte_size: u64) -> bool {
        byte_size as f64 / (1024.0 * 1024.0) > self.max_file_size_mb
    }
}
