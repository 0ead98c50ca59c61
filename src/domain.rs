pub mod catalog;
pub mod deletion;
pub mod ledger;
pub mod protection;
pub mod selection;
pub mod sort;

pub use catalog::AssetCatalog;
pub use deletion::{DeletionCoordinator, DeletionOutcome, DeletionPhase, DeletionTargets};
pub use ledger::DeletionLedger;
pub use protection::ProtectionRegistry;
pub use selection::SelectionSet;
pub use sort::sort_assets;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier of an asset, stable for the lifetime of the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "heic" | "heif" | "gif" | "bmp" | "webp" | "tif"
            | "tiff" => MediaKind::Image,

            "mov" | "mp4" | "m4v" | "avi" | "mkv" | "webm" => MediaKind::Video,

            _ => MediaKind::Other,
        }
    }
}

/// A single media item as reported by the asset store.
///
/// Byte size is not carried here; see [`AssetCatalog::size_of_asset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    pub creation_date: Option<DateTime<Utc>>,
    pub media_kind: MediaKind,
    pub is_screenshot: bool,
}

impl Asset {
    pub fn new(id: impl Into<AssetId>, creation_date: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            creation_date,
            media_kind: MediaKind::Image,
            is_screenshot: false,
        }
    }

    pub fn screenshot(mut self) -> Self {
        self.is_screenshot = true;
        self
    }
}

/// Result of one catalog refresh, replaced wholesale each time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    /// Number of assets of the supported media kind
    pub total_count: usize,
    /// Unprotected screenshots, in display order
    pub candidates: Vec<Asset>,
}

impl CatalogSnapshot {
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Ordering applied to the review list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    #[default]
    Newest,
    Oldest,
    Largest,
}

impl SortStrategy {
    pub const ALL: [SortStrategy; 3] = [
        SortStrategy::Newest,
        SortStrategy::Oldest,
        SortStrategy::Largest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortStrategy::Newest => "Newest First",
            SortStrategy::Oldest => "Oldest First",
            SortStrategy::Largest => "Largest Size",
        }
    }

    pub fn needs_sizes(&self) -> bool {
        matches!(self, SortStrategy::Largest)
    }
}
