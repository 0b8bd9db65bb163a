// models/src/medical/claim_detail.rs

use serde::{Deserialize, Serialize};

/// Mirror key column for claim detail rows.
pub const CLAIM_DETAIL_KEY: &str = "claim_id";

/// Denial and procedure information for a claim.
///
/// `claim` references the owning claim's surrogate key. A claim is expected to
/// own at most one detail; when several exist, the one with the lowest `id` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDetail {
    pub id: u64,
    pub claim: u64,
    pub denial_reason: Option<String>,
    /// Comma-separated CPT codes.
    pub cpt_codes: String,
}

impl ClaimDetail {
    /// Individual CPT codes, trimmed, blanks dropped.
    pub fn cpt_code_list(&self) -> Vec<&str> {
        self.cpt_codes
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .collect()
    }
}
