//! Key-value persistence for engine state
//!
//! The protection registry and the deletion ledger each keep one value under
//! a fixed key. Stores are shared behind `Arc<dyn KeyValueStore>` and serialize
//! access internally, so a reader never sees a half-written value.

use crate::error::{Result, SweepError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Synchronous by contract: values are a few hundred bytes, and a `set` must
/// be durable before the caller swaps in its new in-memory copy. File-backed
/// stores therefore block briefly on disk I/O, even when called from a task.
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw bytes stored under `key`, if any
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, durably before returning
    fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// Volatile store, used by tests and by embedders that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// A JSON object on disk mapping keys to JSON values.
///
/// Every `set` rewrites the whole file through a sibling temp file and a
/// rename. An unreadable file is treated as empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<serde_json::Map<String, serde_json::Value>>,
}

impl JsonFileStore {
    /// Default state file (~/.local/share/snapsweep/state.json or platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("snapsweep").join("state.json"))
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read_map(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(path: &Path) -> serde_json::Map<String, serde_json::Value> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "State file unreadable, starting empty");
                }
                return serde_json::Map::new();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(path = %path.display(), "State file corrupt, starting empty");
                serde_json::Map::new()
            }
        }
    }

    fn write_map(&self, map: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SweepError::Persistence(format!("Failed to create state directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(map).map_err(|e| {
            SweepError::Persistence(format!("Failed to serialize state: {}", e))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .map_err(|e| SweepError::Persistence(format!("Failed to write state file: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| SweepError::Persistence(format!("Failed to replace state file: {}", e)))?;

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values
            .get(key)
            .and_then(|value| serde_json::to_vec(value).ok())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let parsed: serde_json::Value = serde_json::from_slice(&value).map_err(|e| {
            SweepError::Persistence(format!("Value for '{}' is not JSON: {}", key, e))
        })?;

        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        let mut next = values.clone();
        next.insert(key.to_string(), parsed);
        self.write_map(&next)?;
        *values = next;
        Ok(())
    }
}
