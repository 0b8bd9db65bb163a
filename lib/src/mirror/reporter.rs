// lib/src/mirror/reporter.rs

use std::path::Path;

use log::{info, warn};

use super::{MirrorEntity, MirrorFormat};

/// Receives the non-fatal outcomes of a mirror sync. Real failures are
/// returned as `SyncError` instead.
pub trait SyncReporter: Send + Sync {
    fn synced(&self, entity: MirrorEntity, format: MirrorFormat, path: &Path, key: &str);
    fn file_absent(&self, entity: MirrorEntity, format: MirrorFormat, path: &Path);
    fn row_not_found(&self, entity: MirrorEntity, format: MirrorFormat, path: &Path, key: &str);
}

/// Default reporter, writing through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSyncReporter;

impl SyncReporter for LogSyncReporter {
    fn synced(&self, entity: MirrorEntity, format: MirrorFormat, path: &Path, key: &str) {
        info!("Updated {} {} mirror {} for claim {}", entity, format, path.display(), key);
    }

    fn file_absent(&self, entity: MirrorEntity, format: MirrorFormat, path: &Path) {
        info!("Skipping {} {} mirror: {} does not exist", entity, format, path.display());
    }

    fn row_not_found(&self, entity: MirrorEntity, format: MirrorFormat, path: &Path, key: &str) {
        warn!("Claim {} not found in {} {} mirror {}", key, entity, format, path.display());
    }
}
