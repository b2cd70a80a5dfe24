use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::PathManager;

pub const DEFAULT_CATALOG_COLLECTION: &str = "movies";
pub const DEFAULT_USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub mutations: MutationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file backing the local store; defaults to `<data_dir>/store.json`
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default = "default_catalog_collection")]
    pub catalog_collection: String,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
}

/// How the admin episode append writes the grown list back
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppendStrategy {
    /// Compare-and-swap on the document version, re-reading on conflict
    Versioned,
    /// Plain read-then-overwrite; overlapping appends can lose an episode
    Overwrite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    #[serde(default = "default_append_strategy")]
    pub append_strategy: AppendStrategy,
    #[serde(default = "default_max_append_attempts")]
    pub max_append_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Force JSON (true) or plain (false) output; unset picks by terminal
    #[serde(default)]
    pub json: Option<bool>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_catalog_collection() -> String {
    DEFAULT_CATALOG_COLLECTION.to_string()
}

fn default_users_collection() -> String {
    DEFAULT_USERS_COLLECTION.to_string()
}

fn default_append_strategy() -> AppendStrategy {
    AppendStrategy::Versioned
}

fn default_max_append_attempts() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            catalog_collection: default_catalog_collection(),
            users_collection: default_users_collection(),
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            append_strategy: default_append_strategy(),
            max_append_attempts: default_max_append_attempts(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: None,
            file: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.catalog_collection.trim().is_empty() {
            return Err(anyhow::anyhow!("store.catalog_collection cannot be empty"));
        }
        if self.store.users_collection.trim().is_empty() {
            return Err(anyhow::anyhow!("store.users_collection cannot be empty"));
        }
        if self.store.catalog_collection == self.store.users_collection {
            return Err(anyhow::anyhow!(
                "store.catalog_collection and store.users_collection must differ (both are '{}')",
                self.store.catalog_collection
            ));
        }
        if self.mutations.max_append_attempts == 0 {
            return Err(anyhow::anyhow!("mutations.max_append_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Resolved store file: the configured one or the platform default
    pub fn data_file(&self, paths: &PathManager) -> PathBuf {
        self.store.data_file.clone().unwrap_or_else(|| paths.store_file())
    }
}
