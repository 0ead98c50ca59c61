//! Device storage figures shown next to the reclaimed total

use humansize::{format_size, DECIMAL};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl StorageInfo {
    /// Capacity of the volume holding `path`; zeroes when it cannot be queried
    pub fn for_path(path: &Path) -> Self {
        let total = fs4::total_space(path);
        let available = fs4::available_space(path);
        match (total, available) {
            (Ok(total_bytes), Ok(available_bytes)) => Self {
                total_bytes,
                available_bytes,
            },
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!(path = %path.display(), error = %e, "Volume capacity unavailable");
                Self::default()
            }
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    /// Used share of the volume in `0.0..=1.0`
    pub fn used_fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.total_bytes as f64
    }
}

/// File-style byte count in decimal units (kB, MB, GB)
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}
