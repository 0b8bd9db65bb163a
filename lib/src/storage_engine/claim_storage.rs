// lib/src/storage_engine/claim_storage.rs

use std::collections::HashSet;

use async_trait::async_trait;

use models::{Claim, ClaimDetail, NewClaim, Note, SystemFlag, Table};

use crate::errors::Result;
use crate::query::ClaimQuery;

/// The record store. Authoritative for every claim, detail, note and flag.
///
/// Each method is a single-row (or single-table) operation; callers needing
/// several writes issue them in sequence.
#[async_trait]
pub trait ClaimStorageEngine: Send + Sync + 'static {
    fn get_type(&self) -> &'static str;

    /// Inserts a claim, or replaces the fields of the claim with the same
    /// business identifier. Returns the stored claim and whether it was created.
    async fn upsert_claim(&self, claim: NewClaim) -> Result<(Claim, bool)>;
    async fn get_claim(&self, id: u64) -> Result<Option<Claim>>;
    async fn get_claim_by_business_id(&self, claim_id: i64) -> Result<Option<Claim>>;
    /// Writes back a claim that already exists; `NotFound` otherwise.
    async fn update_claim(&self, claim: &Claim) -> Result<()>;
    /// All claims ordered by surrogate id.
    async fn list_claims(&self) -> Result<Vec<Claim>>;

    /// The claim's detail with the lowest id, if any.
    async fn first_detail(&self, claim: u64) -> Result<Option<ClaimDetail>>;
    async fn insert_detail(&self, claim: u64, denial_reason: Option<String>, cpt_codes: String) -> Result<ClaimDetail>;
    async fn update_detail(&self, detail: &ClaimDetail) -> Result<()>;

    async fn add_note(&self, claim: u64, text: String, created_by: Option<String>) -> Result<Note>;
    /// Notes on a claim, newest first.
    async fn notes_for(&self, claim: u64) -> Result<Vec<Note>>;

    /// Stores a flag unless the claim already has one. Returns the active flag
    /// and whether this call created it.
    async fn insert_flag_if_absent(&self, claim: u64, message: String) -> Result<(SystemFlag, bool)>;
    async fn flags_for(&self, claim: u64) -> Result<Vec<SystemFlag>>;
    /// Removes every flag on the claim, returning how many were removed.
    async fn delete_flags_for(&self, claim: u64) -> Result<usize>;
    async fn flagged_claim_ids(&self) -> Result<HashSet<u64>>;

    /// Deletes every row of `table` (and of its dependent tables) and resets
    /// its id sequence. Returns the number of rows removed from `table` itself.
    async fn clear_table(&self, table: Table) -> Result<usize>;

    async fn flush(&self) -> Result<()>;

    /// Claims matching `query`, ordered by surrogate id.
    async fn find_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>> {
        let flagged = if query.flagged_only {
            Some(self.flagged_claim_ids().await?)
        } else {
            None
        };
        Ok(self
            .list_claims()
            .await?
            .into_iter()
            .filter(|claim| query.matches(claim))
            .filter(|claim| flagged.as_ref().map_or(true, |ids| ids.contains(&claim.id)))
            .collect())
    }
}
