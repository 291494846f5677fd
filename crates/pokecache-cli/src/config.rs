//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API base URL, database location and bulk-population tuning.
//!
//! Configuration is stored at `~/.config/pokecache/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use pokecache_core::api::DEFAULT_API_BASE_URL;
use pokecache_core::resolver::{DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE};
use pokecache_core::PopulateSettings;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "pokecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Database file name inside the cache directory
const DATABASE_FILE: &str = "pokecache.db";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub database_path: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub batch_delay_ms: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.database_path {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(DATABASE_FILE))
    }

    pub fn populate_settings(&self) -> PopulateSettings {
        PopulateSettings {
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
            batch_delay: Duration::from_millis(self.batch_delay_ms.unwrap_or(DEFAULT_BATCH_DELAY_MS)),
        }
    }
}
