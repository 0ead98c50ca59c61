//! User configuration and preferences

use crate::domain::SortStrategy;
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct UserConfig {
    /// Ordering used for the review list when no `--sort` is given
    pub default_sort: SortStrategy,
    /// Media library folder; falls back to the platform pictures folder
    pub library: Option<PathBuf>,
    /// Engine state file; falls back to the platform data folder
    pub state_file: Option<PathBuf>,
}

impl UserConfig {
    /// Get the config file path (~/.config/snapsweep/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snapsweep").join("config.json"))
    }

    /// Load config from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            SweepError::ConfigError("Could not determine config directory".to_string())
        })?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            SweepError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            SweepError::ConfigError(format!("Failed to parse config file: {}", e))
        })
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            SweepError::ConfigError("Could not determine config directory".to_string())
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SweepError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SweepError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            SweepError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// The library folder to scan, if one can be determined
    pub fn library_dir(&self) -> Option<PathBuf> {
        self.library.clone().or_else(dirs::picture_dir)
    }
}
