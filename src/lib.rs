//! Snapsweep - reclaim storage by triaging screenshots
//!
//! This crate provides the triage engine behind the `snapsweep` binary:
//! classifying a media library into review candidates, protecting assets the
//! user wants to keep, tracking a deletion selection, and keeping a lifetime
//! tally of reclaimed bytes.

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod persist;
pub mod storage;
pub mod store;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use domain::{
    sort_assets, Asset, AssetCatalog, AssetId, CatalogSnapshot, DeletionCoordinator,
    DeletionLedger, DeletionOutcome, DeletionPhase, MediaKind, ProtectionRegistry, SelectionSet,
    SortStrategy,
};
pub use engine::TriageEngine;
pub use error::{Result, SweepError};
pub use persist::{JsonFileStore, KeyValueStore, MemoryKvStore};
pub use storage::{format_bytes, StorageInfo};
pub use store::{AssetStoreClient, Authorization, DirectoryStore, MemoryAssetStore, StoreError};
