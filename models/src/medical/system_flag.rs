// models/src/medical/system_flag.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FLAG_MESSAGE: &str = "Flagged for review";
pub const MAX_FLAG_MESSAGE_LEN: usize = 255;

/// Review marker on a claim. Its existence is what marks the claim; a claim
/// carries at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFlag {
    pub id: u64,
    pub claim: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
