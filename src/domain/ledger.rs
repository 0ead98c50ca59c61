use crate::error::Result;
use crate::persist::KeyValueStore;
use std::sync::Arc;

pub const LEDGER_KEY: &str = "bytesDeleted";

/// Lifetime counter of bytes reclaimed by successful deletions
pub struct DeletionLedger {
    store: Arc<dyn KeyValueStore>,
    total: u64,
}

impl DeletionLedger {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let total = read_total(store.as_ref());
        Self { store, total }
    }

    /// Last value read or written by this ledger
    pub fn total_bytes_reclaimed(&self) -> u64 {
        self.total
    }

    /// Adds `bytes` to the persisted total and returns the new total.
    ///
    /// The persisted value is re-read first so increments made through another
    /// handle on the same store are not lost.
    pub fn add(&mut self, bytes: u64) -> Result<u64> {
        let current = read_total(self.store.as_ref());
        let next = current.saturating_add(bytes);
        self.total = next;
        self.store.set(LEDGER_KEY, next.to_string().into_bytes())?;
        Ok(next)
    }
}

fn read_total(store: &dyn KeyValueStore) -> u64 {
    let Some(raw) = store.get(LEDGER_KEY) else {
        return 0;
    };

    match std::str::from_utf8(&raw).ok().and_then(|s| s.trim().parse::<u64>().ok()) {
        Some(total) => total,
        None => {
            tracing::warn!(key = LEDGER_KEY, "Reclaimed-bytes counter unreadable, treating as 0");
            0
        }
    }
}
