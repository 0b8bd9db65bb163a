// lib/src/lib.rs
// Claim storage, field merging, mirror file sync and the claim edit
// orchestrator, on top of the shared types in the `models` crate.

pub mod config;
pub mod errors;
pub mod loader;
pub mod merge;
pub mod mirror;
pub mod orchestrator;
pub mod query;
pub mod review;
pub mod stats;
pub mod storage_engine;

pub use models::{Claim, ClaimDetail, ClaimEditForm, MergeField, MergeMode, Note, SystemFlag, Table};

pub use crate::config::{load_config, ClaimsConfig, MirrorConfig, StorageConfig, StorageEngineType};
pub use crate::errors::{ClaimsError, Result, SyncError};
pub use crate::loader::{clear_table, load_claims, LoadReport};
pub use crate::mirror::{LogSyncReporter, MirrorFileAdapter, SyncOutcome, SyncReport, SyncReporter};
pub use crate::orchestrator::{ClaimEditOrchestrator, ClaimEditor, EditOutcome};
pub use crate::query::{ClaimQuery, Page, Paginator};
pub use crate::review::{ClaimListing, ClaimOverview, ClaimReviewService};
pub use crate::stats::{compute_stats, ClaimStats};
pub use crate::storage_engine::{create_storage, ClaimStorageEngine};
