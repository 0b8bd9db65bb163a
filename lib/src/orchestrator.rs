// lib/src/orchestrator.rs
// The claim edit sequence: validate, overwrite direct fields, merge detail
// fields, persist, then bring the mirror files in line.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use models::errors::{FieldErrors, ValidationError};
use models::forms::MAX_CPT_CODES_LEN;
use models::{Claim, ClaimDetail, ClaimEditForm, MergeField, ValidatedClaimEdit};

use crate::errors::{ClaimsError, Result};
use crate::merge::{merge, title_case};
use crate::mirror::{MirrorFileAdapter, SyncOutcome, SyncReport};
use crate::storage_engine::ClaimStorageEngine;

lazy_static! {
    /// One async mutex per claim id. An edit holds it from the first read
    /// until its mirror files are written.
    static ref CLAIM_EDIT_LOCKS: Mutex<HashMap<u64, Arc<AsyncMutex<()>>>> = Mutex::new(HashMap::new());
}

fn edit_lock_for(id: u64) -> Arc<AsyncMutex<()>> {
    let mut locks = match CLAIM_EDIT_LOCKS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    locks.entry(id).or_default().clone()
}

#[async_trait]
pub trait ClaimEditor: Send + Sync {
    async fn edit_claim(&self, id: u64, form: &ClaimEditForm) -> Result<EditOutcome>;
}

/// Mirror results of an edit. Failures here never fail the edit itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MirrorSyncStatus {
    pub reports: Vec<SyncReport>,
    pub errors: Vec<String>,
}

impl MirrorSyncStatus {
    /// No errors and no configured file missing the edited row.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
            && self
                .reports
                .iter()
                .flat_map(|r| r.files.iter())
                .all(|f| f.outcome != SyncOutcome::RowNotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditOutcome {
    pub claim: Claim,
    /// The claim's first detail after merging, when it has one.
    pub detail: Option<ClaimDetail>,
    pub mirrors: MirrorSyncStatus,
}

pub struct ClaimEditOrchestrator {
    storage: Arc<dyn ClaimStorageEngine>,
    mirrors: MirrorFileAdapter,
}

impl ClaimEditOrchestrator {
    pub fn new(storage: Arc<dyn ClaimStorageEngine>, mirrors: MirrorFileAdapter) -> Self {
        ClaimEditOrchestrator { storage, mirrors }
    }

    async fn sync_mirrors(&self, claim: &Claim, detail: Option<&ClaimDetail>) -> MirrorSyncStatus {
        let mut status = MirrorSyncStatus::default();
        match self.mirrors.sync_claim_list(claim).await {
            Ok(report) => status.reports.push(report),
            Err(e) => {
                error!("Claim list mirror sync failed for claim {}: {}", claim.claim_id, e);
                status.errors.push(e.to_string());
            }
        }
        if let Some(detail) = detail {
            match self.mirrors.sync_claim_detail(detail, claim.claim_id).await {
                Ok(report) => status.reports.push(report),
                Err(e) => {
                    error!("Claim detail mirror sync failed for claim {}: {}", claim.claim_id, e);
                    status.errors.push(e.to_string());
                }
            }
        }
        status
    }
}

/// Direct fields always overwrite; text fields are title-cased.
fn apply_direct_fields(claim: &Claim, edit: &ValidatedClaimEdit) -> Claim {
    Claim {
        patient_name: title_case(&edit.patient_name),
        billed_amount: edit.billed_amount,
        paid_amount: edit.paid_amount,
        status: title_case(&edit.status),
        insurer_name: title_case(&edit.insurer_name),
        discharge_date: edit.discharge_date,
        ..claim.clone()
    }
}

/// The length limit on CPT codes also holds after an append.
fn apply_merge_fields(detail: &ClaimDetail, edit: &ValidatedClaimEdit) -> Result<ClaimDetail> {
    let mut merged = detail.clone();
    if edit.cpt_codes.is_some() {
        merged.cpt_codes = merge(Some(&detail.cpt_codes), edit.cpt_codes.as_deref(), edit.cpt_mode, MergeField::CptCodes);
        let len = merged.cpt_codes.chars().count();
        if len > MAX_CPT_CODES_LEN {
            return Err(FieldErrors::single("cpt_codes", ValidationError::TooLong { max: MAX_CPT_CODES_LEN, actual: len }).into());
        }
    }
    if edit.denial_reason.is_some() {
        merged.denial_reason = Some(merge(
            detail.denial_reason.as_deref(),
            edit.denial_reason.as_deref(),
            edit.denial_mode,
            MergeField::DenialReason,
        ));
    }
    Ok(merged)
}

#[async_trait]
impl ClaimEditor for ClaimEditOrchestrator {
    async fn edit_claim(&self, id: u64, form: &ClaimEditForm) -> Result<EditOutcome> {
        let lock = edit_lock_for(id);
        let _guard = lock.lock().await;

        let current = self.storage.get_claim(id).await?.ok_or_else(|| ClaimsError::claim_not_found(id))?;
        let edit = form.validate(current.claim_id)?;

        let claim = apply_direct_fields(&current, &edit);
        let detail = match self.storage.first_detail(current.id).await? {
            Some(detail) => Some(apply_merge_fields(&detail, &edit)?),
            None => {
                if edit.touches_detail() {
                    warn!("Claim {} has no detail row; CPT codes and denial reason were not applied", claim.claim_id);
                }
                None
            }
        };

        self.storage
            .update_claim(&claim)
            .await
            .map_err(|e| e.into_persistence(&format!("saving claim {}", claim.claim_id)))?;
        if let Some(detail) = &detail {
            self.storage
                .update_detail(detail)
                .await
                .map_err(|e| e.into_persistence(&format!("saving detail of claim {}", claim.claim_id)))?;
        }
        info!("Saved edit to {}", claim);
        debug!("Detail after edit of claim {}: {:?}", claim.claim_id, detail);

        let mirrors = self.sync_mirrors(&claim, detail.as_ref()).await;
        Ok(EditOutcome { claim, detail, mirrors })
    }
}
