pub mod config;
pub mod paths;

pub use config::{AppendStrategy, Config, LoggingConfig, MutationConfig, StoreConfig, DEFAULT_CATALOG_COLLECTION, DEFAULT_USERS_COLLECTION};
pub use paths::{PathManager, container_base_path};
