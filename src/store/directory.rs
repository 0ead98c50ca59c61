use super::{AssetFilter, AssetStoreClient, Authorization, StoreError};
use crate::domain::{Asset, AssetId, MediaKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Called with the batch about to be trashed; returning `false` cancels it
pub type ConfirmFn = Arc<dyn Fn(&[AssetId]) -> bool + Send + Sync>;

/// A media library backed by a local folder.
///
/// Asset ids are `/`-separated paths relative to the root. Deleting moves the
/// files to the system trash.
#[derive(Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    confirm: Option<ConfirmFn>,
}

impl std::fmt::Debug for DirectoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryStore")
            .field("root", &self.root)
            .field("confirm", &self.confirm.is_some())
            .finish()
    }
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            confirm: None,
        }
    }

    /// Installs a confirmation prompt consulted before every delete
    pub fn with_confirmation(mut self, confirm: ConfirmFn) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn check_access(&self) -> Authorization {
        let root = self.root.clone();
        let readable = blocking(move || root.is_dir() && fs::read_dir(&root).is_ok()).await;
        if matches!(readable, Ok(true)) {
            Authorization::Granted
        } else {
            Authorization::Denied
        }
    }

    /// Maps an id back to a path inside the root, refusing anything that
    /// escapes it or that a scan would skip as hidden
    fn path_for(root: &Path, id: &AssetId) -> Option<PathBuf> {
        let relative = Path::new(id.as_str());
        let rejected = relative.components().any(|c| match c {
            Component::Normal(name) => is_hidden(name.to_str()),
            _ => true,
        });
        if rejected {
            return None;
        }
        Some(root.join(relative))
    }

    fn asset_for(root: &Path, path: &Path) -> Option<Asset> {
        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        let id = path
            .strip_prefix(root)
            .ok()?
            .to_string_lossy()
            .replace('\\', "/");
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        let creation_date = metadata
            .created()
            .or_else(|_| metadata.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Some(Asset {
            id: AssetId::from(id),
            creation_date,
            media_kind: MediaKind::from_extension(extension),
            is_screenshot: is_screenshot_name(name),
        })
    }

    fn scan(root: &Path, kind: MediaKind, filter: AssetFilter) -> Vec<Asset> {
        let mut assets: Vec<Asset> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Self::asset_for(root, e.path()))
            .filter(|a| a.media_kind == kind && filter.matches(a))
            .collect();

        // Directory iteration order is platform dependent
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        assets
    }
}

/// Platform screenshot naming: "Screenshot 2024-…", "Screen Shot …", "screenshot_…"
fn is_screenshot_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with("screen shot") || name.contains("screenshot")
}

fn is_hidden(name: Option<&str>) -> bool {
    name.map(|n| n.starts_with('.')).unwrap_or(false)
}

async fn blocking<T, F>(work: F) -> Result<T, StoreError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StoreError::Io(io::Error::other(format!("Task panicked: {}", e))))
}

#[async_trait]
impl AssetStoreClient for DirectoryStore {
    async fn authorization(&self) -> Authorization {
        self.check_access().await
    }

    async fn request_authorization(&self) -> Authorization {
        // No prompt exists for plain folders; access is whatever the OS allows
        self.check_access().await
    }

    async fn enumerate(
        &self,
        kind: MediaKind,
        filter: AssetFilter,
    ) -> Result<Vec<Asset>, StoreError> {
        if !self.check_access().await.is_granted() {
            return Err(StoreError::AuthorizationDenied);
        }
        let root = self.root.clone();
        blocking(move || Self::scan(&root, kind, filter)).await
    }

    async fn resolve(&self, ids: &[AssetId]) -> Result<Vec<Asset>, StoreError> {
        if !self.check_access().await.is_granted() {
            return Err(StoreError::AuthorizationDenied);
        }
        let root = self.root.clone();
        let ids = ids.to_vec();
        blocking(move || {
            ids.iter()
                .filter_map(|id| Self::path_for(&root, id))
                .filter_map(|path| Self::asset_for(&root, &path))
                .collect()
        })
        .await
    }

    async fn delete(&self, ids: &[AssetId]) -> Result<(), StoreError> {
        if !self.check_access().await.is_granted() {
            return Err(StoreError::AuthorizationDenied);
        }

        if let Some(confirm) = &self.confirm {
            let confirm = Arc::clone(confirm);
            let batch = ids.to_vec();
            if !blocking(move || confirm(&batch)).await? {
                return Err(StoreError::Cancelled);
            }
        }

        let root = self.root.clone();
        let ids = ids.to_vec();
        blocking(move || {
            let paths: Vec<PathBuf> = ids
                .iter()
                .filter_map(|id| Self::path_for(&root, id))
                .filter(|path| path.is_file())
                .collect();
            if paths.len() < ids.len() {
                tracing::debug!(
                    requested = ids.len(),
                    present = paths.len(),
                    "Skipping ids that are not files in the library"
                );
            }
            if paths.is_empty() {
                return Ok(());
            }
            trash::delete_all(&paths).map_err(|e| StoreError::Trash(e.to_string()))
        })
        .await?
    }

    async fn resource_sizes(&self, asset: &Asset) -> Result<Vec<u64>, StoreError> {
        let Some(path) = Self::path_for(&self.root, &asset.id) else {
            return Ok(Vec::new());
        };
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(vec![metadata.len()]),
            Ok(_) => Ok(Vec::new()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn library() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("IMG_0001.jpg"), vec![0u8; 100]).unwrap();
        fs::write(root.join("Screenshot 2024-05-01 at 10.00.00.png"), vec![0u8; 250]).unwrap();
        fs::write(root.join("notes.txt"), b"not media").unwrap();
        fs::write(root.join(".hidden_screenshot.png"), b"x").unwrap();
        fs::create_dir(root.join("DCIM")).unwrap();
        fs::write(root.join("DCIM").join("Screen Shot 2019.PNG"), vec![0u8; 40]).unwrap();
        fs::write(root.join("DCIM").join("clip.mov"), vec![0u8; 10]).unwrap();
        temp_dir
    }

    mod classification_tests {
        use super::*;

        #[test]
        fn test_screenshot_names() {
            assert!(is_screenshot_name("Screenshot 2024-01-01.png"));
            assert!(is_screenshot_name("Screen Shot 2019-03-02 at 1.png"));
            assert!(is_screenshot_name("Screenshot_20240101-101010.png"));
            assert!(is_screenshot_name("IMG_screenshot.png"));
            assert!(!is_screenshot_name("IMG_0001.jpg"));
            assert!(!is_screenshot_name("screen.png"));
        }

        #[test]
        fn test_path_for_rejects_escapes() {
            let root = Path::new("/library");
            assert!(DirectoryStore::path_for(root, &AssetId::from("../etc/passwd")).is_none());
            assert!(DirectoryStore::path_for(root, &AssetId::from("/etc/passwd")).is_none());
            assert!(DirectoryStore::path_for(root, &AssetId::from(".trash/a.png")).is_none());
            assert_eq!(
                DirectoryStore::path_for(root, &AssetId::from("DCIM/a.png")),
                Some(PathBuf::from("/library/DCIM/a.png"))
            );
        }
    }

    mod directory_store_tests {
        use super::*;

        #[tokio::test]
        async fn test_enumerate_images_recursively() {
            let temp_dir = library();
            let store = DirectoryStore::new(temp_dir.path());

            let images = store.enumerate(MediaKind::Image, AssetFilter::All).await.unwrap();
            let ids: Vec<_> = images.iter().map(|a| a.id.as_str()).collect();
            assert_eq!(
                ids,
                vec![
                    "DCIM/Screen Shot 2019.PNG",
                    "IMG_0001.jpg",
                    "Screenshot 2024-05-01 at 10.00.00.png",
                ]
            );
            assert!(images.iter().all(|a| a.creation_date.is_some()));
        }

        #[tokio::test]
        async fn test_enumerate_screenshots_only() {
            let temp_dir = library();
            let store = DirectoryStore::new(temp_dir.path());

            let shots = store
                .enumerate(MediaKind::Image, AssetFilter::Screenshots)
                .await
                .unwrap();
            assert_eq!(shots.len(), 2);
            assert!(shots.iter().all(|a| a.is_screenshot));
        }

        #[tokio::test]
        async fn test_missing_root_is_denied() {
            let temp_dir = TempDir::new().unwrap();
            let store = DirectoryStore::new(temp_dir.path().join("nope"));

            assert_eq!(store.authorization().await, Authorization::Denied);
            let result = store.enumerate(MediaKind::Image, AssetFilter::All).await;
            assert!(matches!(result, Err(StoreError::AuthorizationDenied)));
        }

        #[tokio::test]
        async fn test_resolve_and_sizes() {
            let temp_dir = library();
            let store = DirectoryStore::new(temp_dir.path());

            let resolved = store
                .resolve(&[AssetId::from("IMG_0001.jpg"), AssetId::from("missing.png")])
                .await
                .unwrap();
            assert_eq!(resolved.len(), 1);

            let sizes = store.resource_sizes(&resolved[0]).await.unwrap();
            assert_eq!(sizes, vec![100]);

            let missing = store
                .resource_sizes(&Asset::new("missing.png", None))
                .await
                .unwrap();
            assert!(missing.is_empty());
        }

        #[tokio::test]
        async fn test_declined_confirmation_cancels() {
            let temp_dir = library();
            let asked = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&asked);
            let store = DirectoryStore::new(temp_dir.path()).with_confirmation(Arc::new(
                move |ids: &[AssetId]| {
                    counter.fetch_add(ids.len(), Ordering::SeqCst);
                    false
                },
            ));

            let result = store.delete(&[AssetId::from("IMG_0001.jpg")]).await;

            assert!(matches!(result, Err(StoreError::Cancelled)));
            assert_eq!(asked.load(Ordering::SeqCst), 1);
            assert!(temp_dir.path().join("IMG_0001.jpg").exists());
        }

        #[tokio::test]
        async fn test_resolve_skips_hidden_files_like_scan() {
            let temp_dir = library();
            let store = DirectoryStore::new(temp_dir.path());

            let resolved = store
                .resolve(&[AssetId::from(".hidden_screenshot.png")])
                .await
                .unwrap();
            assert!(resolved.is_empty());

            store
                .delete(&[AssetId::from(".hidden_screenshot.png")])
                .await
                .unwrap();
            assert!(temp_dir.path().join(".hidden_screenshot.png").exists());
        }

        #[tokio::test]
        async fn test_delete_never_trashes_directories() {
            let temp_dir = library();
            let store = DirectoryStore::new(temp_dir.path());

            let resolved = store.resolve(&[AssetId::from("DCIM")]).await.unwrap();
            assert!(resolved.is_empty());

            store.delete(&[AssetId::from("DCIM")]).await.unwrap();
            assert!(temp_dir.path().join("DCIM").is_dir());
            assert!(temp_dir.path().join("DCIM").join("clip.mov").exists());
        }

        #[tokio::test]
        async fn test_delete_of_only_missing_ids_succeeds() {
            let temp_dir = library();
            let store = DirectoryStore::new(temp_dir.path());

            let result = store.delete(&[AssetId::from("already-gone.png")]).await;
            assert!(result.is_ok());
        }
    }
}
