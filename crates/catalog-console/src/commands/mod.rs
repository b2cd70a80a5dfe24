pub mod add;
pub mod append;
pub mod delete;
pub mod list;
pub mod prompts;
pub mod stats;

use catalog_config::{Config, PathManager};
use catalog_core::{CatalogError, CatalogGateway, ConsoleMirrors, Mirror};
use catalog_models::CatalogItem;
use catalog_store::{DocumentStore, InMemoryStore};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::output::Output;

/// Loaded configuration plus the local store every command works against
pub struct Console {
    pub config: Config,
    data_file: PathBuf,
    store: Arc<InMemoryStore>,
}

impl Console {
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = config_file.unwrap_or_else(|| paths.config_file());

        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let data_file = config.data_file(&paths);
        let store = InMemoryStore::load_from_file(&data_file)
            .wrap_err_with(|| format!("Failed to load catalog store from {}", data_file.display()))?;
        debug!("Using catalog store {}", store.store_name());

        Ok(Self {
            config,
            data_file,
            store: Arc::new(store),
        })
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn gateway(&self) -> CatalogGateway {
        CatalogGateway::from_config(self.store(), &self.config)
    }

    pub fn catalog_mirror(&self) -> Result<Mirror<CatalogItem>> {
        Mirror::open(self.store(), &self.config.store.catalog_collection, catalog_core::decode_document)
            .wrap_err("Failed to load the catalog")
    }

    pub fn mirrors(&self) -> Result<ConsoleMirrors> {
        ConsoleMirrors::from_config(self.store(), &self.config).wrap_err("Failed to load the catalog")
    }

    /// Write the store back so the next invocation sees this one's changes.
    /// Refused when another run changed the same documents in the meantime.
    pub fn save(&self) -> Result<()> {
        match self.store.save_to_file(&self.data_file) {
            Ok(()) => {
                debug!("Catalog store saved to {}", self.data_file.display());
                Ok(())
            }
            Err(e) if e.is_save_conflict() => Err(color_eyre::Report::new(e)
                .wrap_err("Another console run changed the same catalog items; nothing from this run was saved, run the command again")),
            Err(e) => Err(color_eyre::Report::new(e)
                .wrap_err(format!("Failed to save catalog store to {}", self.data_file.display()))),
        }
    }
}

/// Show the failure and turn it into the command's error
pub fn fail(output: &Output, err: CatalogError) -> color_eyre::Report {
    output.catalog_error(&err);
    let message = err.user_message();
    color_eyre::Report::new(err).wrap_err(message)
}
