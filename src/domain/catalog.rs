use super::{sort_assets, Asset, AssetId, CatalogSnapshot, MediaKind, SortStrategy};
use crate::store::{AssetFilter, AssetStoreClient, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Read-only view over the asset store that builds the review candidate list
pub struct AssetCatalog {
    store: Arc<dyn AssetStoreClient>,
    kind: MediaKind,
    snapshot: CatalogSnapshot,
}

impl AssetCatalog {
    pub fn new(store: Arc<dyn AssetStoreClient>) -> Self {
        Self::with_kind(store, MediaKind::Image)
    }

    pub fn with_kind(store: Arc<dyn AssetStoreClient>, kind: MediaKind) -> Self {
        Self {
            store,
            kind,
            snapshot: CatalogSnapshot::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn AssetStoreClient> {
        &self.store
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    /// Re-enumerates the store and replaces the snapshot.
    ///
    /// Candidates are the screenshots whose ids are not in `protected`,
    /// ordered newest first. Without authorization, or when the store cannot
    /// be read, the snapshot is empty.
    pub async fn refresh(&mut self, protected: &HashSet<AssetId>) -> &CatalogSnapshot {
        self.snapshot = match self.build_snapshot(protected).await {
            Ok(snapshot) => snapshot,
            Err(StoreError::AuthorizationDenied) => {
                tracing::info!("Media library access not granted, catalog is empty");
                CatalogSnapshot::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to enumerate media library");
                CatalogSnapshot::default()
            }
        };

        tracing::info!(
            total = self.snapshot.total_count,
            candidates = self.snapshot.candidate_count(),
            protected = protected.len(),
            "Catalog refreshed"
        );
        &self.snapshot
    }

    async fn build_snapshot(
        &self,
        protected: &HashSet<AssetId>,
    ) -> Result<CatalogSnapshot, StoreError> {
        if !self.store.authorization().await.is_granted() {
            return Err(StoreError::AuthorizationDenied);
        }

        let total_count = self.store.enumerate(self.kind, AssetFilter::All).await?.len();

        let mut candidates: Vec<Asset> = self
            .store
            .enumerate(self.kind, AssetFilter::Screenshots)
            .await?
            .into_iter()
            .filter(|asset| asset.is_screenshot && !protected.contains(&asset.id))
            .collect();
        sort_assets(&mut candidates, SortStrategy::Newest, |_| 0);

        Ok(CatalogSnapshot {
            total_count,
            candidates,
        })
    }

    /// Byte size of the asset with `id`, or 0 when it cannot be resolved
    pub async fn size_of(&self, id: &AssetId) -> u64 {
        match self.store.resolve(std::slice::from_ref(id)).await {
            Ok(assets) => match assets.first() {
                Some(asset) => self.size_of_asset(asset).await,
                None => {
                    tracing::debug!(asset = %id, "Asset no longer resolves, size 0");
                    0
                }
            },
            Err(e) => {
                tracing::debug!(asset = %id, error = %e, "Size lookup failed, size 0");
                0
            }
        }
    }

    /// Byte size from the asset's first resource, or 0 when it has none
    pub async fn size_of_asset(&self, asset: &Asset) -> u64 {
        match self.store.resource_sizes(asset).await {
            Ok(sizes) => sizes.first().copied().unwrap_or(0),
            Err(e) => {
                tracing::debug!(asset = %asset.id, error = %e, "Resource size unavailable, size 0");
                0
            }
        }
    }

    /// Sizes for every distinct asset in `assets`, each looked up once
    pub async fn resolve_sizes(&self, assets: &[Asset]) -> HashMap<AssetId, u64> {
        let mut sizes = HashMap::with_capacity(assets.len());
        for asset in assets {
            if !sizes.contains_key(&asset.id) {
                let size = self.size_of_asset(asset).await;
                sizes.insert(asset.id.clone(), size);
            }
        }
        sizes
    }

    /// The current candidates ordered by `strategy`
    pub async fn sorted_candidates(&self, strategy: SortStrategy) -> Vec<Asset> {
        let mut assets = self.snapshot.candidates.clone();
        let sizes = if strategy.needs_sizes() {
            self.resolve_sizes(&assets).await
        } else {
            HashMap::new()
        };
        sort_assets(&mut assets, strategy, |a| {
            sizes.get(&a.id).copied().unwrap_or(0)
        });
        assets
    }

    /// Live assets among `ids`.
    ///
    /// `None` means the store could not answer (no authorization, I/O
    /// failure), which callers must not confuse with "none are live".
    pub async fn resolve_live(&self, ids: &[AssetId]) -> Option<Vec<Asset>> {
        if !self.store.authorization().await.is_granted() {
            return None;
        }
        match self.store.resolve(ids).await {
            Ok(assets) => Some(assets),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve assets");
                None
            }
        }
    }
}
