//! Asset store boundary
//!
//! The engine never touches the media library directly. Everything it needs
//! goes through [`AssetStoreClient`], whose calls may suspend while the
//! underlying library does its work (or asks the user to confirm a delete).

pub mod directory;

pub use directory::DirectoryStore;

use crate::domain::{Asset, AssetId, MediaKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Access to the media library was not granted")]
    AuthorizationDenied,

    /// The user declined the store's confirmation prompt
    #[error("Deletion was cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trash error: {0}")]
    Trash(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    NotDetermined,
    Granted,
    Denied,
}

impl Authorization {
    pub fn is_granted(&self) -> bool {
        matches!(self, Authorization::Granted)
    }
}

/// Predicate applied during enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetFilter {
    #[default]
    All,
    Screenshots,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        match self {
            AssetFilter::All => true,
            AssetFilter::Screenshots => asset.is_screenshot,
        }
    }
}

#[async_trait]
pub trait AssetStoreClient: Send + Sync {
    async fn authorization(&self) -> Authorization;

    /// Asks for access, possibly prompting the user
    async fn request_authorization(&self) -> Authorization;

    /// All assets of `kind` matching `filter`, in store order
    async fn enumerate(
        &self,
        kind: MediaKind,
        filter: AssetFilter,
    ) -> Result<Vec<Asset>, StoreError>;

    /// The subset of `ids` that still resolve to live assets
    async fn resolve(&self, ids: &[AssetId]) -> Result<Vec<Asset>, StoreError>;

    /// Deletes all `ids` as one batch. The store may ask the user first.
    async fn delete(&self, ids: &[AssetId]) -> Result<(), StoreError>;

    /// Byte sizes of the asset's underlying resources; the first is authoritative
    async fn resource_sizes(&self, asset: &Asset) -> Result<Vec<u64>, StoreError>;
}

#[derive(Debug)]
struct MemoryState {
    authorization: Authorization,
    grant_on_request: bool,
    fail_deletes: bool,
    /// `Some(applied)` makes `delete` never return
    stall_deletes: Option<bool>,
    assets: Vec<(Asset, Option<u64>)>,
    delete_calls: usize,
}

/// In-memory asset store with switchable authorization and delete failures
#[derive(Debug)]
pub struct MemoryAssetStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAssetStore {
    /// An authorized, empty store
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                authorization: Authorization::Granted,
                grant_on_request: true,
                fail_deletes: false,
                stall_deletes: None,
                assets: Vec::new(),
                delete_calls: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Adds an asset; `size` of `None` models a resource without size metadata
    pub fn insert(&self, asset: Asset, size: Option<u64>) {
        self.lock().assets.push((asset, size));
    }

    /// Removes an asset behind the engine's back
    pub fn remove_externally(&self, id: &str) {
        self.lock().assets.retain(|(a, _)| a.id.as_str() != id);
    }

    pub fn set_authorization(&self, authorization: Authorization) {
        self.lock().authorization = authorization;
    }

    /// Whether `request_authorization` grants access
    pub fn set_grant_on_request(&self, grant: bool) {
        self.lock().grant_on_request = grant;
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }

    /// Makes `delete` hang forever. With `applied` the batch is removed
    /// first, as when the store did the work but its reply never arrives.
    pub fn stall_deletes(&self, applied: bool) {
        self.lock().stall_deletes = Some(applied);
    }

    pub fn resume_deletes(&self) {
        self.lock().stall_deletes = None;
    }

    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().assets.iter().any(|(a, _)| a.id.as_str() == id)
    }
}

#[async_trait]
impl AssetStoreClient for MemoryAssetStore {
    async fn authorization(&self) -> Authorization {
        self.lock().authorization
    }

    async fn request_authorization(&self) -> Authorization {
        let mut state = self.lock();
        if state.authorization == Authorization::NotDetermined {
            state.authorization = if state.grant_on_request {
                Authorization::Granted
            } else {
                Authorization::Denied
            };
        }
        state.authorization
    }

    async fn enumerate(
        &self,
        kind: MediaKind,
        filter: AssetFilter,
    ) -> Result<Vec<Asset>, StoreError> {
        let state = self.lock();
        if !state.authorization.is_granted() {
            return Err(StoreError::AuthorizationDenied);
        }
        Ok(state
            .assets
            .iter()
            .map(|(a, _)| a)
            .filter(|a| a.media_kind == kind && filter.matches(a))
            .cloned()
            .collect())
    }

    async fn resolve(&self, ids: &[AssetId]) -> Result<Vec<Asset>, StoreError> {
        let state = self.lock();
        if !state.authorization.is_granted() {
            return Err(StoreError::AuthorizationDenied);
        }
        let by_id: HashMap<&AssetId, &Asset> =
            state.assets.iter().map(|(a, _)| (&a.id, a)).collect();
        Ok(ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|&a| a.clone()))
            .collect())
    }

    async fn delete(&self, ids: &[AssetId]) -> Result<(), StoreError> {
        let stalled = {
            let mut state = self.lock();
            state.delete_calls += 1;
            if !state.authorization.is_granted() {
                return Err(StoreError::AuthorizationDenied);
            }
            if state.fail_deletes {
                return Err(StoreError::Cancelled);
            }
            match state.stall_deletes {
                Some(false) => true,
                Some(true) | None => {
                    state.assets.retain(|(a, _)| !ids.contains(&a.id));
                    state.stall_deletes.is_some()
                }
            }
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn resource_sizes(&self, asset: &Asset) -> Result<Vec<u64>, StoreError> {
        let state = self.lock();
        Ok(state
            .assets
            .iter()
            .find(|(a, _)| a.id == asset.id)
            .and_then(|(_, size)| *size)
            .into_iter()
            .collect())
    }
}
