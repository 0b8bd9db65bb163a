// models/src/medical/note.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-text note attached to a claim. Notes are never edited once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub claim: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

impl Note {
    /// Short preview of the body, used in listings.
    pub fn preview(&self) -> String {
        self.text.chars().take(20).collect()
    }
}
