// lib/src/storage_engine/mod.rs

// Module declarations
pub mod claim_storage;
pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_utils;

// Re-export key types and traits for external use
pub use claim_storage::ClaimStorageEngine;
pub use inmemory_storage::InMemoryClaimStorage;
pub use sled_storage::{open_sled_db, SledClaimStorage};

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageEngineType};

/// Creates a storage engine instance based on the provided configuration.
///
/// Sled keeps its files under `data_directory/sled`; InMemory ignores the path.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn ClaimStorageEngine>> {
    match config.engine {
        StorageEngineType::Sled => {
            let path = config.data_directory.join("sled");
            let db = open_sled_db(&path).with_context(|| format!("Failed to open claim store at {}", path.display()))?;
            let storage = SledClaimStorage::new(db)?;
            info!("Using sled claim store at {}", path.display());
            Ok(Arc::new(storage) as Arc<dyn ClaimStorageEngine>)
        }
        StorageEngineType::InMemory => {
            info!("Using in-memory claim store; nothing will be persisted");
            Ok(Arc::new(InMemoryClaimStorage::new()) as Arc<dyn ClaimStorageEngine>)
        }
    }
}
