// Configuration management for songbook
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory or http(s) base URL the static catalog files are served from
    pub source_root: String,
    pub manifest: String,
    pub disc_dir: String,
    /// Single-catalog CSV used when no manifest can be found
    pub legacy_csv: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    pub search_debounce_ms: u64,
    pub random_sample_size: usize,
    pub recent_limit: usize,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = Self::base_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self {
            catalog: CatalogConfig {
                source_root: ".".to_string(),
                manifest: "discs.json".to_string(),
                disc_dir: "discs".to_string(),
                legacy_csv: Some("songs.csv".to_string()),
            },
            storage: StorageConfig {
                database_path: config_dir.join("songbook.db"),
            },
            ui: UiConfig {
                search_debounce_ms: 300,
                random_sample_size: 10,
                recent_limit: 20,
                log_dir: config_dir.join("logs"),
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid config in {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    fn base_dir() -> Result<PathBuf> {
        Ok(config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("songbook"))
    }
}
