use super::AssetId;
use crate::error::{Result, SweepError};
use crate::persist::KeyValueStore;
use std::collections::HashSet;
use std::sync::Arc;

pub const PROTECTION_KEY: &str = "protectedAssets";

/// Persisted set of asset ids the user never wants offered for deletion.
///
/// Changing membership does not refresh the catalog; callers must do that.
pub struct ProtectionRegistry {
    store: Arc<dyn KeyValueStore>,
    ids: HashSet<AssetId>,
}

impl ProtectionRegistry {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let ids = match store.get(PROTECTION_KEY) {
            None => HashSet::new(),
            Some(raw) => match serde_json::from_slice::<Vec<AssetId>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(key = PROTECTION_KEY, error = %e, "Protected set unreadable, treating as empty");
                    HashSet::new()
                }
            },
        };

        Self { store, ids }
    }

    pub fn ids(&self) -> &HashSet<AssetId> {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flips membership of `id` and persists the new set.
    ///
    /// Returns whether the id is protected afterwards. On a write failure the
    /// in-memory set is left as it was.
    pub fn toggle(&mut self, id: &AssetId) -> Result<bool> {
        let mut next = self.ids.clone();
        let protected = if next.remove(id) {
            false
        } else {
            next.insert(id.clone());
            true
        };

        self.persist(&next)?;
        self.ids = next;
        tracing::debug!(asset = %id, protected, "Toggled protection");
        Ok(protected)
    }

    /// Drops every id in `ids` from the set, persisting only if something was removed.
    pub fn remove_all<'a, I>(&mut self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a AssetId>,
    {
        let before = self.ids.len();
        for id in ids {
            self.ids.remove(id);
        }
        let removed = before - self.ids.len();
        if removed > 0 {
            self.persist(&self.ids)?;
        }
        Ok(removed)
    }

    /// Keeps only ids that still resolve in the store.
    ///
    /// Returns the number of orphaned ids dropped. Persisted state is rewritten
    /// only when that number is non-zero.
    pub fn reconcile(&mut self, live_ids: &HashSet<AssetId>) -> Result<usize> {
        let before = self.ids.len();
        self.ids.retain(|id| live_ids.contains(id));
        let dropped = before - self.ids.len();
        if dropped > 0 {
            tracing::info!(dropped, "Dropped protected ids that no longer resolve");
            self.persist(&self.ids)?;
        }
        Ok(dropped)
    }

    fn persist(&self, ids: &HashSet<AssetId>) -> Result<()> {
        let list: Vec<&AssetId> = ids.iter().collect();
        let bytes = serde_json::to_vec(&list).map_err(|e| {
            SweepError::Persistence(format!("Failed to serialize protected set: {}", e))
        })?;
        self.store.set(PROTECTION_KEY, bytes)
    }
}
