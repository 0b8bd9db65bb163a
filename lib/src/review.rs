// lib/src/review.rs
// Staff review of claims: browsing, notes and review flags.

use std::sync::Arc;

use log::info;
use serde::Serialize;

use models::errors::{FieldErrors, ValidationError};
use models::medical::{DEFAULT_FLAG_MESSAGE, MAX_FLAG_MESSAGE_LEN};
use models::{Claim, ClaimDetail, Note, SystemFlag};

use crate::errors::{ClaimsError, Result};
use crate::merge::sentence_case;
use crate::query::{ClaimQuery, Page, Paginator};
use crate::storage_engine::ClaimStorageEngine;

/// A claim as shown in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimListing {
    pub claim: Claim,
    pub flagged: bool,
}

/// Everything shown on a claim's detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimOverview {
    pub claim: Claim,
    pub detail: Option<ClaimDetail>,
    /// Newest first.
    pub notes: Vec<Note>,
    pub flags: Vec<SystemFlag>,
}

impl ClaimOverview {
    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }
}

pub struct ClaimReviewService {
    storage: Arc<dyn ClaimStorageEngine>,
}

impl ClaimReviewService {
    pub fn new(storage: Arc<dyn ClaimStorageEngine>) -> Self {
        ClaimReviewService { storage }
    }

    async fn require_claim(&self, id: u64) -> Result<Claim> {
        self.storage.get_claim(id).await?.ok_or_else(|| ClaimsError::claim_not_found(id))
    }

    /// Filters claims and serves the requested page.
    pub async fn list(&self, query: &ClaimQuery, page: Option<&str>, paginator: &Paginator) -> Result<Page<ClaimListing>> {
        let flagged = self.storage.flagged_claim_ids().await?;
        let listings = self
            .storage
            .find_claims(query)
            .await?
            .into_iter()
            .map(|claim| ClaimListing { flagged: flagged.contains(&claim.id), claim })
            .collect();
        Ok(paginator.get_page(listings, page))
    }

    pub async fn overview(&self, id: u64) -> Result<ClaimOverview> {
        let claim = self.require_claim(id).await?;
        Ok(ClaimOverview {
            detail: self.storage.first_detail(id).await?,
            notes: self.storage.notes_for(id).await?,
            flags: self.storage.flags_for(id).await?,
            claim,
        })
    }

    /// Saves a sentence-cased note. Blank text is rejected.
    pub async fn add_note(&self, id: u64, text: &str, author: Option<&str>) -> Result<Note> {
        let claim = self.require_claim(id).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(FieldErrors::single("text", ValidationError::Required).into());
        }
        let author = author.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string);
        let note = self.storage.add_note(claim.id, sentence_case(text), author).await?;
        info!("Added note {} to {}", note.id, claim);
        Ok(note)
    }

    pub async fn notes(&self, id: u64) -> Result<Vec<Note>> {
        self.require_claim(id).await?;
        self.storage.notes_for(id).await
    }

    /// Flags the claim for review unless it already is. Returns the active
    /// flag and whether this call raised it.
    pub async fn raise_flag(&self, id: u64, message: Option<&str>) -> Result<(SystemFlag, bool)> {
        let claim = self.require_claim(id).await?;
        let message = message.map(str::trim).filter(|m| !m.is_empty()).unwrap_or(DEFAULT_FLAG_MESSAGE);
        let len = message.chars().count();
        if len > MAX_FLAG_MESSAGE_LEN {
            return Err(FieldErrors::single("message", ValidationError::TooLong { max: MAX_FLAG_MESSAGE_LEN, actual: len }).into());
        }
        let (flag, created) = self.storage.insert_flag_if_absent(claim.id, message.to_string()).await?;
        if created {
            info!("Flagged {}: {}", claim, flag.message);
        } else {
            info!("{} is already flagged", claim);
        }
        Ok((flag, created))
    }

    /// Removes every flag on the claim.
    pub async fn clear_flags(&self, id: u64) -> Result<usize> {
        let claim = self.require_claim(id).await?;
        let removed = self.storage.delete_flags_for(claim.id).await?;
        info!("Cleared {} flag(s) from {}", removed, claim);
        Ok(removed)
    }
}
