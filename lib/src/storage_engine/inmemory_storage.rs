// lib/src/storage_engine/inmemory_storage.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use models::{Claim, ClaimDetail, NewClaim, Note, SystemFlag, Table};

use super::claim_storage::ClaimStorageEngine;
use crate::errors::{ClaimsError, Result};

#[derive(Debug, Default)]
struct Tables {
    claims: BTreeMap<u64, Claim>,
    details: BTreeMap<u64, ClaimDetail>,
    notes: BTreeMap<u64, Note>,
    /// Keyed by claim id.
    flags: BTreeMap<u64, SystemFlag>,
    sequences: HashMap<Table, u64>,
}

impl Tables {
    fn next_id(&mut self, table: Table) -> u64 {
        let counter = self.sequences.entry(table).or_insert(0);
        *counter += 1;
        *counter
    }

    fn clear(&mut self, table: Table) -> usize {
        match table {
            Table::Claims => std::mem::take(&mut self.claims).len(),
            Table::ClaimDetails => std::mem::take(&mut self.details).len(),
            Table::Notes => std::mem::take(&mut self.notes).len(),
            Table::Flags => std::mem::take(&mut self.flags).len(),
        }
    }
}

/// Non-persistent store for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryClaimStorage {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryClaimStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimStorageEngine for InMemoryClaimStorage {
    fn get_type(&self) -> &'static str {
        "InMemory"
    }

    async fn upsert_claim(&self, claim: NewClaim) -> Result<(Claim, bool)> {
        let mut tables = self.tables.write().await;
        let existing = tables.claims.values().find(|c| c.claim_id == claim.claim_id).map(|c| c.id);
        let (id, created) = match existing {
            Some(id) => (id, false),
            None => (tables.next_id(Table::Claims), true),
        };
        let stored = claim.into_claim(id);
        tables.claims.insert(id, stored.clone());
        Ok((stored, created))
    }

    async fn get_claim(&self, id: u64) -> Result<Option<Claim>> {
        Ok(self.tables.read().await.claims.get(&id).cloned())
    }

    async fn get_claim_by_business_id(&self, claim_id: i64) -> Result<Option<Claim>> {
        let tables = self.tables.read().await;
        Ok(tables.claims.values().find(|c| c.claim_id == claim_id).cloned())
    }

    async fn update_claim(&self, claim: &Claim) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.claims.get_mut(&claim.id) {
            Some(slot) => {
                *slot = claim.clone();
                Ok(())
            }
            None => Err(ClaimsError::claim_not_found(claim.id)),
        }
    }

    async fn list_claims(&self) -> Result<Vec<Claim>> {
        Ok(self.tables.read().await.claims.values().cloned().collect())
    }

    async fn first_detail(&self, claim: u64) -> Result<Option<ClaimDetail>> {
        let tables = self.tables.read().await;
        Ok(tables.details.values().find(|d| d.claim == claim).cloned())
    }

    async fn insert_detail(&self, claim: u64, denial_reason: Option<String>, cpt_codes: String) -> Result<ClaimDetail> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id(Table::ClaimDetails);
        let detail = ClaimDetail { id, claim, denial_reason, cpt_codes };
        tables.details.insert(id, detail.clone());
        Ok(detail)
    }

    async fn update_detail(&self, detail: &ClaimDetail) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.details.get_mut(&detail.id) {
            Some(slot) if slot.claim == detail.claim => {
                *slot = detail.clone();
                Ok(())
            }
            _ => Err(ClaimsError::NotFound(format!(
                "detail {} of claim {} does not exist",
                detail.id, detail.claim
            ))),
        }
    }

    async fn add_note(&self, claim: u64, text: String, created_by: Option<String>) -> Result<Note> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id(Table::Notes);
        let note = Note { id, claim, text, created_at: Utc::now(), created_by };
        tables.notes.insert(id, note.clone());
        Ok(note)
    }

    async fn notes_for(&self, claim: u64) -> Result<Vec<Note>> {
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables.notes.values().filter(|n| n.claim == claim).cloned().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }

    async fn insert_flag_if_absent(&self, claim: u64, message: String) -> Result<(SystemFlag, bool)> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.flags.get(&claim) {
            return Ok((existing.clone(), false));
        }
        let flag = SystemFlag { id: tables.next_id(Table::Flags), claim, message, created_at: Utc::now() };
        tables.flags.insert(claim, flag.clone());
        Ok((flag, true))
    }

    async fn flags_for(&self, claim: u64) -> Result<Vec<SystemFlag>> {
        Ok(self.tables.read().await.flags.get(&claim).cloned().into_iter().collect())
    }

    async fn delete_flags_for(&self, claim: u64) -> Result<usize> {
        Ok(usize::from(self.tables.write().await.flags.remove(&claim).is_some()))
    }

    async fn flagged_claim_ids(&self) -> Result<HashSet<u64>> {
        Ok(self.tables.read().await.flags.keys().copied().collect())
    }

    async fn clear_table(&self, table: Table) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let removed = tables.clear(table);
        for dependent in table.dependents() {
            tables.clear(*dependent);
        }
        tables.sequences.remove(&table);
        Ok(removed)
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ClaimQuery;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn new_claim(claim_id: i64, patient: &str, status: &str) -> NewClaim {
        NewClaim {
            claim_id,
            patient_name: patient.to_string(),
            billed_amount: Decimal::new(10_000, 2),
            paid_amount: Decimal::ZERO,
            status: status.to_string(),
            insurer_name: "Acme Health".to_string(),
            discharge_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn should_find_flagged_claims_only() {
        let storage = InMemoryClaimStorage::new();
        let (a, _) = storage.upsert_claim(new_claim(10, "Ann Lee", "Denied")).await.unwrap();
        storage.upsert_claim(new_claim(11, "Bob Ray", "Denied")).await.unwrap();
        storage.insert_flag_if_absent(a.id, "Check".to_string()).await.unwrap();

        let query = ClaimQuery { flagged_only: true, ..Default::default() };
        let found = storage.find_claims(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].claim_id, 10);
    }

    #[tokio::test]
    async fn should_list_notes_newest_first() {
        let storage = InMemoryClaimStorage::new();
        let (claim, _) = storage.upsert_claim(new_claim(10, "Ann Lee", "Denied")).await.unwrap();
        storage.add_note(claim.id, "First".to_string(), None).await.unwrap();
        storage.add_note(claim.id, "Second".to_string(), Some("staff".to_string())).await.unwrap();
        storage.add_note(99, "Other claim".to_string(), None).await.unwrap();
        let notes = storage.notes_for(claim.id).await.unwrap();
        let texts: Vec<&str> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn should_reset_sequence_only_for_cleared_table() {
        let storage = InMemoryClaimStorage::new();
        let (claim, _) = storage.upsert_claim(new_claim(10, "Ann Lee", "Denied")).await.unwrap();
        storage.add_note(claim.id, "One".to_string(), None).await.unwrap();
        storage.add_note(claim.id, "Two".to_string(), None).await.unwrap();
        assert_eq!(storage.clear_table(Table::Notes).await.unwrap(), 2);
        let note = storage.add_note(claim.id, "Three".to_string(), None).await.unwrap();
        assert_eq!(note.id, 1);
        assert!(storage.get_claim(claim.id).await.unwrap().is_some());
    }
}
