//! Review session over one media library
//!
//! [`TriageEngine`] owns the catalog, the persisted protection registry and
//! ledger, and the ephemeral selection. It is the single writer for all of
//! them: every mutation takes `&mut self` and completes its store I/O before
//! touching shared state, so callers on one task never observe a half-applied
//! change.

use crate::domain::{
    Asset, AssetCatalog, AssetId, DeletionCoordinator, DeletionLedger, DeletionOutcome,
    DeletionPhase, DeletionTargets, ProtectionRegistry, SelectionSet, SortStrategy,
};
use crate::error::Result;
use crate::persist::KeyValueStore;
use crate::store::{AssetStoreClient, Authorization};
use std::collections::HashSet;
use std::sync::Arc;

pub struct TriageEngine {
    catalog: AssetCatalog,
    registry: ProtectionRegistry,
    ledger: DeletionLedger,
    coordinator: DeletionCoordinator,
    selection: SelectionSet,
    sort: SortStrategy,
    display: Vec<Asset>,
    protected_assets: Vec<Asset>,
}

impl TriageEngine {
    /// Creates an engine over `store`, loading persisted state from `state`.
    ///
    /// Nothing is enumerated until [`refresh`](Self::refresh) or
    /// [`request_access_and_refresh`](Self::request_access_and_refresh).
    pub fn new(store: Arc<dyn AssetStoreClient>, state: Arc<dyn KeyValueStore>) -> Self {
        Self {
            catalog: AssetCatalog::new(store),
            registry: ProtectionRegistry::load(Arc::clone(&state)),
            ledger: DeletionLedger::load(state),
            coordinator: DeletionCoordinator::new(),
            selection: SelectionSet::new(),
            sort: SortStrategy::default(),
            display: Vec::new(),
            protected_assets: Vec::new(),
        }
    }

    pub fn with_sort(mut self, sort: SortStrategy) -> Self {
        self.sort = sort;
        self
    }

    pub fn total_count(&self) -> usize {
        self.catalog.snapshot().total_count
    }

    pub fn candidate_count(&self) -> usize {
        self.catalog.snapshot().candidate_count()
    }

    /// Candidates in the order last produced by the current sort strategy
    pub fn candidates(&self) -> &[Asset] {
        &self.display
    }

    pub fn sort_strategy(&self) -> SortStrategy {
        self.sort
    }

    pub fn selected_ids(&self) -> &HashSet<AssetId> {
        self.selection.ids()
    }

    pub fn protected_ids(&self) -> &HashSet<AssetId> {
        self.registry.ids()
    }

    /// Protected assets as of the last [`load_protected`](Self::load_protected)
    pub fn protected_assets(&self) -> &[Asset] {
        &self.protected_assets
    }

    pub fn total_bytes_reclaimed(&self) -> u64 {
        self.ledger.total_bytes_reclaimed()
    }

    pub fn deletion_phase(&self) -> DeletionPhase {
        self.coordinator.phase()
    }

    /// Asks the store for access, then loads the catalog and the protected vault
    pub async fn request_access_and_refresh(&mut self) -> Authorization {
        let authorization = self.catalog.store().request_authorization().await;
        if authorization.is_granted() {
            self.refresh().await;
            self.load_protected().await;
        } else {
            tracing::info!(?authorization, "Media library access not granted");
        }
        authorization
    }

    /// Rebuilds the catalog and the display list
    pub async fn refresh(&mut self) {
        self.catalog.refresh(self.registry.ids()).await;
        self.rebuild_display().await;
    }

    /// Re-orders the display list
    pub async fn set_sort(&mut self, sort: SortStrategy) {
        self.sort = sort;
        self.rebuild_display().await;
    }

    async fn rebuild_display(&mut self) {
        self.display = self.catalog.sorted_candidates(self.sort).await;
        let dropped = self.selection.retain_displayed(&self.display);
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped selected ids no longer on display");
        }
    }

    /// Flips protection for `id` and refreshes, since protection changes the
    /// candidate filter. Returns whether the asset is protected afterwards.
    pub async fn toggle_protection(&mut self, id: &AssetId) -> Result<bool> {
        let protected = self.registry.toggle(id)?;
        self.refresh().await;
        Ok(protected)
    }

    /// Resolves the protected ids to live assets and drops the ones that
    /// vanished from the store.
    pub async fn load_protected(&mut self) -> &[Asset] {
        let ids: Vec<AssetId> = self.registry.ids().iter().cloned().collect();
        match self.catalog.resolve_live(&ids).await {
            Some(mut live) => {
                let live_ids: HashSet<AssetId> = live.iter().map(|a| a.id.clone()).collect();
                if let Err(e) = self.registry.reconcile(&live_ids) {
                    tracing::warn!(error = %e, "Failed to persist reconciled protected set");
                }
                crate::domain::sort_assets(&mut live, SortStrategy::Newest, |_| 0);
                self.protected_assets = live;
            }
            None => {
                tracing::debug!("Store unavailable, protected vault not loaded");
                self.protected_assets.clear();
            }
        }
        &self.protected_assets
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.display);
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    /// Flips selection of a displayed asset.
    ///
    /// Returns `None`, leaving the selection untouched, when `id` is not on
    /// display; otherwise whether it is selected afterwards.
    pub fn toggle_selection(&mut self, id: &AssetId) -> Option<bool> {
        if !self.display.iter().any(|a| &a.id == id) {
            tracing::debug!(asset = %id, "Ignoring selection of an asset not on display");
            return None;
        }
        Some(self.selection.toggle(id))
    }

    /// Ends the review session, discarding the selection
    pub fn close_review(&mut self) {
        self.selection.deselect_all();
    }

    pub async fn size_of(&self, asset: &Asset) -> u64 {
        self.catalog.size_of_asset(asset).await
    }

    /// Bytes that deleting the current selection would free
    pub async fn selected_total_bytes(&self) -> u64 {
        let selected: Vec<Asset> = self.selection.selected_in(&self.display).cloned().collect();
        let sizes = self.catalog.resolve_sizes(&selected).await;
        self.selection
            .total_bytes(&self.display, |a| sizes.get(&a.id).copied().unwrap_or(0))
    }

    /// Deletes every selected asset.
    ///
    /// On success the ledger, registry, catalog, display list and selection
    /// are all updated before this returns. On failure none of them change.
    pub async fn delete_selected(&mut self) -> Result<DeletionOutcome> {
        let ids: Vec<AssetId> = self
            .selection
            .selected_in(&self.display)
            .map(|a| a.id.clone())
            .collect();

        let outcome = self
            .coordinator
            .delete(
                ids,
                DeletionTargets {
                    catalog: &mut self.catalog,
                    registry: &mut self.registry,
                    ledger: &mut self.ledger,
                    selection: &mut self.selection,
                },
            )
            .await?;

        if outcome.requested > 0 {
            self.rebuild_display().await;
            self.load_protected().await;
        }
        Ok(outcome)
    }

    /// Settles a deletion whose caller stopped waiting after it reached the
    /// store, e.g. through a timeout. Until then `delete_selected` returns
    /// [`SweepError::DeletionInFlight`](crate::SweepError::DeletionInFlight).
    ///
    /// Assets the store did delete get the usual bookkeeping and the outcome
    /// is returned. If it deleted nothing the selection is kept for a retry.
    pub async fn recover_deletion(&mut self) -> Option<DeletionOutcome> {
        let outcome = self
            .coordinator
            .recover(DeletionTargets {
                catalog: &mut self.catalog,
                registry: &mut self.registry,
                ledger: &mut self.ledger,
                selection: &mut self.selection,
            })
            .await?;

        self.rebuild_display().await;
        self.load_protected().await;
        Some(outcome)
    }
}
