// lib/src/config/config_defaults.rs

use std::path::PathBuf;

use super::StorageEngineType;

pub const DEFAULT_CONFIG_FILE: &str = "claimdesk.toml";
pub const ENV_PREFIX: &str = "CLAIMDESK";
pub const DEFAULT_DATA_DIRECTORY: &str = "./claimdesk_data";
pub const DEFAULT_MIRROR_DELIMITER: char = '|';
pub const DEFAULT_PER_PAGE: usize = 5;

pub fn default_data_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIRECTORY)
}
pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::Sled }
pub fn default_delimiter() -> char { DEFAULT_MIRROR_DELIMITER }
pub fn default_per_page() -> usize { DEFAULT_PER_PAGE }
