// lib/src/storage_engine/sled_storage.rs

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use sled::{Db, Tree};

use models::{Claim, ClaimDetail, NewClaim, Note, SystemFlag, Table};

use super::claim_storage::ClaimStorageEngine;
use super::storage_utils::{
    business_id_key, child_key, deserialize_record, id_key, parse_id, serialize_record,
};
use crate::errors::{ClaimsError, Result};

/// Opens (creating if needed) the sled database under `path`.
pub fn open_sled_db(path: &Path) -> Result<Db> {
    if !path.exists() {
        info!("Creating database directory at {:?}", path);
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(ClaimsError::ConfigurationError(format!("Path {:?} is not a directory", path)));
    }
    let db = sled::Config::new().path(path).open().map_err(|e| {
        ClaimsError::DatabaseError(format!(
            "Failed to open Sled database at {:?}: {}. Ensure the directory is accessible.",
            path, e
        ))
    })?;
    info!("Opened Sled database at {:?}", path);
    Ok(db)
}

/// Sled-backed implementation of the `ClaimStorageEngine` trait.
///
/// Trees: `claims` (id → claim), `claim_ids` (business id → id),
/// `claim_details` and `notes` (claim id ++ row id → row), `flags`
/// (claim id → flag, so a claim can never hold two) and `sequences`
/// (table name → last issued id).
pub struct SledClaimStorage {
    db: Db,
    claims: Tree,
    claim_ids: Tree,
    details: Tree,
    notes: Tree,
    flags: Tree,
    sequences: Tree,
}

impl SledClaimStorage {
    pub fn new(db: Db) -> Result<Self> {
        Ok(Self {
            claims: db.open_tree("claims")?,
            claim_ids: db.open_tree("claim_ids")?,
            details: db.open_tree("claim_details")?,
            notes: db.open_tree("notes")?,
            flags: db.open_tree("flags")?,
            sequences: db.open_tree("sequences")?,
            db,
        })
    }

    fn tree(&self, table: Table) -> &Tree {
        match table {
            Table::Claims => &self.claims,
            Table::ClaimDetails => &self.details,
            Table::Notes => &self.notes,
            Table::Flags => &self.flags,
        }
    }

    fn next_id(&self, table: Table) -> Result<u64> {
        let next = self.sequences.update_and_fetch(table.name(), |old| {
            let current = old
                .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
                .map(u64::from_be_bytes)
                .unwrap_or(0);
            Some((current + 1).to_be_bytes().to_vec())
        })?;
        let bytes = next.ok_or_else(|| ClaimsError::DatabaseError(format!("sequence for {} vanished", table)))?;
        parse_id(&bytes)
    }

    fn clear_tree(&self, table: Table) -> Result<usize> {
        let tree = self.tree(table);
        let removed = tree.len();
        tree.clear()?;
        if table == Table::Claims {
            self.claim_ids.clear()?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl ClaimStorageEngine for SledClaimStorage {
    fn get_type(&self) -> &'static str {
        "sled"
    }

    async fn upsert_claim(&self, claim: NewClaim) -> Result<(Claim, bool)> {
        let index_key = business_id_key(claim.claim_id);
        let (id, created) = match self.claim_ids.get(index_key)? {
            Some(raw) => (parse_id(&raw)?, false),
            None => (self.next_id(Table::Claims)?, true),
        };
        let stored = claim.into_claim(id);
        self.claims.insert(id_key(id), serialize_record(&stored)?)?;
        if created {
            self.claim_ids.insert(index_key, id_key(id).to_vec())?;
        }
        debug!("Upserted claim {} as id {} (created: {})", stored.claim_id, id, created);
        Ok((stored, created))
    }

    async fn get_claim(&self, id: u64) -> Result<Option<Claim>> {
        match self.claims.get(id_key(id))? {
            Some(bytes) => Ok(Some(deserialize_record(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_claim_by_business_id(&self, claim_id: i64) -> Result<Option<Claim>> {
        match self.claim_ids.get(business_id_key(claim_id))? {
            Some(raw) => self.get_claim(parse_id(&raw)?).await,
            None => Ok(None),
        }
    }

    async fn update_claim(&self, claim: &Claim) -> Result<()> {
        let key = id_key(claim.id);
        if !self.claims.contains_key(key)? {
            return Err(ClaimsError::claim_not_found(claim.id));
        }
        self.claims.insert(key, serialize_record(claim)?)?;
        Ok(())
    }

    async fn list_claims(&self) -> Result<Vec<Claim>> {
        let mut claims = Vec::with_capacity(self.claims.len());
        for item in self.claims.iter() {
            let (_key, value) = item?;
            claims.push(deserialize_record(&value)?);
        }
        Ok(claims)
    }

    async fn first_detail(&self, claim: u64) -> Result<Option<ClaimDetail>> {
        match self.details.scan_prefix(id_key(claim)).next() {
            Some(item) => {
                let (_key, value) = item?;
                Ok(Some(deserialize_record(&value)?))
            }
            None => Ok(None),
        }
    }

    async fn insert_detail(&self, claim: u64, denial_reason: Option<String>, cpt_codes: String) -> Result<ClaimDetail> {
        let id = self.next_id(Table::ClaimDetails)?;
        let detail = ClaimDetail { id, claim, denial_reason, cpt_codes };
        self.details.insert(child_key(claim, id), serialize_record(&detail)?)?;
        Ok(detail)
    }

    async fn update_detail(&self, detail: &ClaimDetail) -> Result<()> {
        let key = child_key(detail.claim, detail.id);
        if !self.details.contains_key(&key)? {
            return Err(ClaimsError::NotFound(format!(
                "detail {} of claim {} does not exist",
                detail.id, detail.claim
            )));
        }
        self.details.insert(key, serialize_record(detail)?)?;
        Ok(())
    }

    async fn add_note(&self, claim: u64, text: String, created_by: Option<String>) -> Result<Note> {
        let id = self.next_id(Table::Notes)?;
        let note = Note { id, claim, text, created_at: Utc::now(), created_by };
        self.notes.insert(child_key(claim, id), serialize_record(&note)?)?;
        Ok(note)
    }

    async fn notes_for(&self, claim: u64) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = Vec::new();
        for item in self.notes.scan_prefix(id_key(claim)) {
            let (_key, value) = item?;
            notes.push(deserialize_record(&value)?);
        }
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }

    async fn insert_flag_if_absent(&self, claim: u64, message: String) -> Result<(SystemFlag, bool)> {
        let key = id_key(claim);
        if let Some(existing) = self.flags.get(key)? {
            return Ok((deserialize_record(&existing)?, false));
        }
        let flag = SystemFlag { id: self.next_id(Table::Flags)?, claim, message, created_at: Utc::now() };
        let bytes = serialize_record(&flag)?;
        match self.flags.compare_and_swap(key, None as Option<&[u8]>, Some(bytes))? {
            Ok(()) => Ok((flag, true)),
            Err(conflict) => {
                warn!("Flag on claim {} was raised concurrently; keeping the existing one", claim);
                match conflict.current {
                    Some(current) => Ok((deserialize_record(&current)?, false)),
                    None => Err(ClaimsError::DatabaseError(format!("flag on claim {} changed during insert", claim))),
                }
            }
        }
    }

    async fn flags_for(&self, claim: u64) -> Result<Vec<SystemFlag>> {
        match self.flags.get(id_key(claim))? {
            Some(bytes) => Ok(vec![deserialize_record(&bytes)?]),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_flags_for(&self, claim: u64) -> Result<usize> {
        Ok(usize::from(self.flags.remove(id_key(claim))?.is_some()))
    }

    async fn flagged_claim_ids(&self) -> Result<HashSet<u64>> {
        let mut ids = HashSet::new();
        for key in self.flags.iter().keys() {
            ids.insert(parse_id(&key?)?);
        }
        Ok(ids)
    }

    async fn clear_table(&self, table: Table) -> Result<usize> {
        let removed = self.clear_tree(table)?;
        for dependent in table.dependents() {
            let cascaded = self.clear_tree(*dependent)?;
            debug!("Cascaded clear of {} removed {} rows from {}", table, cascaded, dependent);
        }
        self.sequences.remove(table.name())?;
        info!("Table {} cleared ({} rows) and id sequence reset", table, removed);
        Ok(removed)
    }

    async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn new_claim(claim_id: i64, status: &str) -> NewClaim {
        NewClaim {
            claim_id,
            patient_name: "Jane Doe".to_string(),
            billed_amount: Decimal::from_str("250.00").unwrap(),
            paid_amount: Decimal::from_str("100.00").unwrap(),
            status: status.to_string(),
            insurer_name: "Acme Health".to_string(),
            discharge_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    fn open(dir: &TempDir) -> SledClaimStorage {
        SledClaimStorage::new(open_sled_db(&dir.path().join("db")).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn should_upsert_claims_by_business_id() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);

        let (first, created) = storage.upsert_claim(new_claim(42, "Submitted")).await.unwrap();
        assert!(created);
        assert_eq!(first.id, 1);

        let (second, created) = storage.upsert_claim(new_claim(42, "Paid")).await.unwrap();
        assert!(!created);
        assert_eq!(second.id, 1);

        storage.upsert_claim(new_claim(7, "Denied")).await.unwrap();
        let by_business = storage.get_claim_by_business_id(42).await.unwrap().unwrap();
        assert_eq!(by_business.status, "Paid");
        let ids: Vec<u64> = storage.list_claims().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn should_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let storage = open(&dir);
            let (claim, _) = storage.upsert_claim(new_claim(42, "Submitted")).await.unwrap();
            storage.insert_detail(claim.id, None, "99213".to_string()).await.unwrap();
            storage.flush().await.unwrap();
        }
        let storage = open(&dir);
        let detail = storage.first_detail(1).await.unwrap().unwrap();
        assert_eq!(detail.cpt_codes, "99213");
        let (claim, created) = storage.upsert_claim(new_claim(43, "Submitted")).await.unwrap();
        assert!(created);
        assert_eq!(claim.id, 2);
    }

    #[tokio::test]
    async fn should_return_first_detail_of_claim() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);
        let (a, _) = storage.upsert_claim(new_claim(1, "Paid")).await.unwrap();
        let (b, _) = storage.upsert_claim(new_claim(2, "Paid")).await.unwrap();
        storage.insert_detail(b.id, None, "B1".to_string()).await.unwrap();
        storage.insert_detail(a.id, None, "A1".to_string()).await.unwrap();
        storage.insert_detail(a.id, None, "A2".to_string()).await.unwrap();
        assert_eq!(storage.first_detail(a.id).await.unwrap().unwrap().cpt_codes, "A1");
        assert_eq!(storage.first_detail(b.id).await.unwrap().unwrap().cpt_codes, "B1");
        assert!(storage.first_detail(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_refuse_updates_of_missing_rows() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);
        let (mut claim, _) = storage.upsert_claim(new_claim(1, "Paid")).await.unwrap();
        claim.id = 50;
        assert!(matches!(storage.update_claim(&claim).await, Err(ClaimsError::NotFound(_))));
        let detail = ClaimDetail { id: 3, claim: 1, denial_reason: None, cpt_codes: String::new() };
        assert!(matches!(storage.update_detail(&detail).await, Err(ClaimsError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_keep_a_single_flag_per_claim() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);
        let (flag, created) = storage.insert_flag_if_absent(1, "First".to_string()).await.unwrap();
        assert!(created);
        let (again, created) = storage.insert_flag_if_absent(1, "Second".to_string()).await.unwrap();
        assert!(!created);
        assert_eq!(again, flag);
        assert_eq!(storage.flags_for(1).await.unwrap().len(), 1);
        assert_eq!(storage.flagged_claim_ids().await.unwrap(), HashSet::from([1]));
        assert_eq!(storage.delete_flags_for(1).await.unwrap(), 1);
        assert_eq!(storage.delete_flags_for(1).await.unwrap(), 0);
        assert!(storage.flags_for(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_clear_claims_with_cascade_and_reset_ids() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);
        let (claim, _) = storage.upsert_claim(new_claim(1, "Paid")).await.unwrap();
        storage.upsert_claim(new_claim(2, "Paid")).await.unwrap();
        storage.add_note(claim.id, "Called insurer".to_string(), None).await.unwrap();
        storage.insert_flag_if_absent(claim.id, "Review".to_string()).await.unwrap();

        assert_eq!(storage.clear_table(Table::Claims).await.unwrap(), 2);
        assert!(storage.list_claims().await.unwrap().is_empty());
        assert!(storage.notes_for(claim.id).await.unwrap().is_empty());
        assert!(storage.flagged_claim_ids().await.unwrap().is_empty());
        assert!(storage.get_claim_by_business_id(1).await.unwrap().is_none());

        let (fresh, created) = storage.upsert_claim(new_claim(3, "Paid")).await.unwrap();
        assert!(created);
        assert_eq!(fresh.id, 1);
    }
}
