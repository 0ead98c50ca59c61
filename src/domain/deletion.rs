use super::{AssetCatalog, AssetId, DeletionLedger, ProtectionRegistry, SelectionSet};
use crate::error::{Result, SweepError};
use std::collections::{HashMap, HashSet};

/// Where the coordinator is in its single pass. There are no retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionPhase {
    #[default]
    Idle,
    Resolving,
    Requesting,
    Succeeded,
    Failed,
}

impl DeletionPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, DeletionPhase::Resolving | DeletionPhase::Requesting)
    }
}

/// What a successful deletion changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionOutcome {
    /// Ids submitted to the store
    pub requested: usize,
    /// Bytes added to the lifetime ledger by this deletion
    pub bytes_reclaimed: u64,
    pub total_bytes_reclaimed: u64,
    /// Protected ids dropped by the post-deletion reconcile
    pub orphans_dropped: usize,
    /// False when a ledger or registry write failed after the store deleted
    pub state_saved: bool,
}

/// The engine state a deletion reads and updates
pub struct DeletionTargets<'a> {
    pub catalog: &'a mut AssetCatalog,
    pub registry: &'a mut ProtectionRegistry,
    pub ledger: &'a mut DeletionLedger,
    pub selection: &'a mut SelectionSet,
}

/// Resets a phase abandoned before the store was asked to delete anything
struct PhaseGuard<'a> {
    phase: &'a mut DeletionPhase,
}

impl PhaseGuard<'_> {
    fn set(&mut self, phase: DeletionPhase) {
        *self.phase = phase;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if *self.phase == DeletionPhase::Resolving {
            *self.phase = DeletionPhase::Idle;
        }
    }
}

#[derive(Debug, Default)]
pub struct DeletionCoordinator {
    phase: DeletionPhase,
    /// Ids and sizes of a request handed to the store and not yet answered
    pending: Vec<(AssetId, u64)>,
}

impl DeletionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DeletionPhase {
        self.phase
    }

    /// Returns to `Idle`, forgetting any unanswered request.
    pub fn reset(&mut self) {
        self.phase = DeletionPhase::Idle;
        self.pending.clear();
    }

    /// Deletes `ids` as one batch and, on success, brings every piece of
    /// engine state up to date before returning.
    ///
    /// On failure nothing persisted changes and the selection is kept for a
    /// retry. A call while another request is outstanding is rejected.
    pub async fn delete(
        &mut self,
        ids: Vec<AssetId>,
        targets: DeletionTargets<'_>,
    ) -> Result<DeletionOutcome> {
        if self.phase.is_in_flight() {
            return Err(SweepError::DeletionInFlight);
        }

        if ids.is_empty() {
            tracing::debug!("Nothing selected, skipping delete request");
            self.phase = DeletionPhase::Idle;
            return Ok(DeletionOutcome {
                total_bytes_reclaimed: targets.ledger.total_bytes_reclaimed(),
                state_saved: true,
                ..Default::default()
            });
        }

        let mut guard = PhaseGuard {
            phase: &mut self.phase,
        };

        guard.set(DeletionPhase::Resolving);
        let catalog = &*targets.catalog;
        let resolved = catalog.resolve_live(&ids).await.unwrap_or_default();
        if resolved.len() < ids.len() {
            tracing::debug!(
                requested = ids.len(),
                resolved = resolved.len(),
                "Some selected assets no longer resolve, counting them as 0 bytes"
            );
        }
        let mut sizes: HashMap<AssetId, u64> = HashMap::with_capacity(resolved.len());
        for asset in &resolved {
            sizes.insert(asset.id.clone(), catalog.size_of_asset(asset).await);
        }
        let size_of_deletion = sizes
            .values()
            .fold(0u64, |total, &bytes| total.saturating_add(bytes));

        self.pending = ids
            .iter()
            .map(|id| (id.clone(), sizes.get(id).copied().unwrap_or(0)))
            .collect();
        guard.set(DeletionPhase::Requesting);
        let response = catalog.store().delete(&ids).await;
        self.pending.clear();

        if let Err(e) = response {
            guard.set(DeletionPhase::Failed);
            tracing::warn!(requested = ids.len(), error = %e, "Delete request failed");
            return Err(SweepError::DeleteRequestFailed(e.to_string()));
        }

        let outcome = apply_deletion(&ids, size_of_deletion, targets).await;
        guard.set(DeletionPhase::Succeeded);
        Ok(outcome)
    }

    /// Settles a request whose caller stopped waiting after it reached the
    /// store, so the coordinator accepts new deletions again.
    ///
    /// The submitted ids are resolved again. Those that are gone were deleted
    /// and get the same bookkeeping as a completed request. If none are gone,
    /// or the store cannot answer, the request counts as failed and nothing
    /// changes. Returns `None` unless something was deleted.
    pub async fn recover(&mut self, targets: DeletionTargets<'_>) -> Option<DeletionOutcome> {
        if self.phase != DeletionPhase::Requesting {
            return None;
        }
        let pending = std::mem::take(&mut self.pending);
        let ids: Vec<AssetId> = pending.iter().map(|(id, _)| id.clone()).collect();

        let Some(live) = targets.catalog.resolve_live(&ids).await else {
            tracing::warn!(
                requested = ids.len(),
                "Store unavailable, abandoned deletion counted as failed"
            );
            self.phase = DeletionPhase::Failed;
            return None;
        };
        let live: HashSet<AssetId> = live.into_iter().map(|a| a.id).collect();

        let (gone, bytes) = pending
            .into_iter()
            .filter(|(id, _)| !live.contains(id))
            .fold((Vec::new(), 0u64), |(mut gone, bytes), (id, size)| {
                gone.push(id);
                (gone, bytes.saturating_add(size))
            });

        if gone.is_empty() {
            tracing::info!(requested = ids.len(), "Abandoned deletion left every asset in place");
            self.phase = DeletionPhase::Failed;
            return None;
        }

        tracing::info!(
            requested = ids.len(),
            deleted = gone.len(),
            "Settling abandoned deletion"
        );
        let outcome = apply_deletion(&gone, bytes, targets).await;
        self.phase = DeletionPhase::Succeeded;
        Some(outcome)
    }
}

/// Post-deletion bookkeeping: ledger, registry, catalog, reconcile, selection.
/// Write failures are logged and reported through `state_saved`.
async fn apply_deletion(
    ids: &[AssetId],
    size_of_deletion: u64,
    targets: DeletionTargets<'_>,
) -> DeletionOutcome {
    let DeletionTargets {
        catalog,
        registry,
        ledger,
        selection,
    } = targets;

    let mut state_saved = true;

    let total_bytes_reclaimed = match ledger.add(size_of_deletion) {
        Ok(total) => total,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to persist reclaimed bytes");
            state_saved = false;
            ledger.total_bytes_reclaimed()
        }
    };

    if let Err(e) = registry.remove_all(ids) {
        tracing::warn!(error = %e, "Failed to persist protected set after deletion");
        state_saved = false;
    }

    catalog.refresh(registry.ids()).await;

    let protected: Vec<AssetId> = registry.ids().iter().cloned().collect();
    let orphans_dropped = match catalog.resolve_live(&protected).await {
        Some(live) => {
            let live: HashSet<AssetId> = live.into_iter().map(|a| a.id).collect();
            match registry.reconcile(&live) {
                Ok(dropped) => dropped,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to persist reconciled protected set");
                    state_saved = false;
                    0
                }
            }
        }
        None => {
            tracing::debug!("Store unavailable, skipping protected set reconcile");
            0
        }
    };

    selection.deselect_all();

    tracing::info!(
        requested = ids.len(),
        bytes = size_of_deletion,
        total = total_bytes_reclaimed,
        "Deletion complete"
    );

    DeletionOutcome {
        requested: ids.len(),
        bytes_reclaimed: size_of_deletion,
        total_bytes_reclaimed,
        orphans_dropped,
        state_saved,
    }
}
