// lib/src/mirror/locks.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use tokio::sync::Mutex as AsyncMutex;

lazy_static! {
    /// One async mutex per mirror file, keyed by absolute path, shared by every
    /// adapter in the process.
    static ref MIRROR_FILE_LOCKS: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>> = Mutex::new(HashMap::new());
}

/// Returns the lock guarding read-modify-write of `path`.
pub fn lock_for(path: &Path) -> Arc<AsyncMutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = match MIRROR_FILE_LOCKS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    locks.entry(key).or_default().clone()
}
