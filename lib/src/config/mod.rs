// lib/src/config/mod.rs
// Layered configuration: built-in defaults, then an optional TOML file, then
// CLAIMDESK__* environment variables.

pub mod config_defaults;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, Environment, File};
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use config_defaults::*;

use crate::errors::{ClaimsError, Result};

/// Which record store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngineType {
    Sled,
    #[serde(alias = "in_memory", alias = "memory")]
    InMemory,
}

impl FromStr for StorageEngineType {
    type Err = ClaimsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageEngineType::Sled),
            "inmemory" | "in_memory" | "memory" => Ok(StorageEngineType::InMemory),
            _ => Err(ClaimsError::ConfigurationError(format!("Unknown storage engine type: {}", s))),
        }
    }
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageEngineType::Sled => write!(f, "sled"),
            StorageEngineType::InMemory => write!(f, "inmemory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_engine_type")]
    pub engine: StorageEngineType,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            engine: default_storage_engine_type(),
            data_directory: default_data_directory(),
        }
    }
}

/// Locations of the flat-file mirrors. A format whose path is unset, or whose
/// file does not exist, is treated as disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub claim_list_jsonl: Option<PathBuf>,
    #[serde(default)]
    pub claim_list_tabular: Option<PathBuf>,
    #[serde(default)]
    pub claim_detail_jsonl: Option<PathBuf>,
    #[serde(default)]
    pub claim_detail_tabular: Option<PathBuf>,
    /// Field separator of the tabular files. Never a comma: free text and CPT
    /// code lists contain commas.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        MirrorConfig {
            claim_list_jsonl: None,
            claim_list_tabular: None,
            claim_detail_jsonl: None,
            claim_detail_tabular: None,
            delimiter: default_delimiter(),
        }
    }
}

impl MirrorConfig {
    /// Mirrors laid out in one directory under their conventional names.
    pub fn in_directory(dir: &Path) -> Self {
        MirrorConfig {
            claim_list_jsonl: Some(dir.join("claim_list_data.jsonl")),
            claim_list_tabular: Some(dir.join("claim_list_data.psv")),
            claim_detail_jsonl: Some(dir.join("claim_detail_data.jsonl")),
            claim_detail_tabular: Some(dir.join("claim_detail_data.psv")),
            delimiter: default_delimiter(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(self.delimiter, ',' | '"' | '\n' | '\r') {
            return Err(ClaimsError::ConfigurationError(format!(
                "mirror delimiter {:?} is not allowed; use a single non-comma character such as '|'",
                self.delimiter
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig { per_page: default_per_page() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimsConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl ClaimsConfig {
    pub fn validate(&self) -> Result<()> {
        self.mirror.validate()?;
        if self.pagination.per_page == 0 {
            return Err(ClaimsError::ConfigurationError("pagination.per_page must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Loads the configuration.
///
/// An explicit `config_file` must exist; otherwise `claimdesk.toml` in the
/// working directory is used when present. Environment variables such as
/// `CLAIMDESK__STORAGE__DATA_DIRECTORY` override both.
pub fn load_config(config_file: Option<&Path>) -> Result<ClaimsConfig> {
    let mut builder = Config::builder();
    match config_file {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
        }
        None => debug!("No configuration file found, using defaults"),
    }
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__"));

    let config: ClaimsConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
