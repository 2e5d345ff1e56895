//! Configuration
//!
//! Raw TOML structures, multi-source loading, and conversion into the
//! typed application settings.

pub mod file_config;
pub mod loader;

pub use file_config::{
    FileConfig, FileLimitsConfig, FileModelEntry, FileModelsConfig, FileProviderConfig,
    FileStoreConfig, FileStreamConfig, FileTimeoutsConfig,
};
pub use loader::ConfigLoader;

use council_application::registry::RegistryError;
use thiserror::Error;

/// Errors raised while loading or applying configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("configuration load failed: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("missing API key: set ${0}")]
    MissingApiKey(String),

    #[error("provider client: {0}")]
    Provider(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
