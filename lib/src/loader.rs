// lib/src/loader.rs
// Bulk claim import from JSON exports, and table maintenance.

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use models::forms::{parse_amount, parse_date};
use models::{NewClaim, Table};

use crate::errors::{ClaimsError, Result};
use crate::storage_engine::ClaimStorageEngine;

/// Amounts arrive as JSON numbers or as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AmountValue {
    Number(serde_json::Number),
    Text(String),
}

impl AmountValue {
    fn as_text(&self) -> String {
        match self {
            AmountValue::Number(n) => n.to_string(),
            AmountValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ClaimRecord {
    id: i64,
    patient_name: String,
    billed_amount: AmountValue,
    paid_amount: AmountValue,
    status: String,
    insurer_name: String,
    discharge_date: String,
    #[serde(default)]
    cpt_codes: Option<String>,
    #[serde(default)]
    denial_reason: Option<String>,
}

/// A validated import row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimImport {
    pub claim: NewClaim,
    pub cpt_codes: Option<String>,
    pub denial_reason: Option<String>,
}

impl ClaimImport {
    fn has_detail(&self) -> bool {
        self.cpt_codes.is_some() || self.denial_reason.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub created: usize,
    pub updated: usize,
}

impl TryFrom<ClaimRecord> for ClaimImport {
    type Error = String;

    fn try_from(record: ClaimRecord) -> std::result::Result<Self, Self::Error> {
        let billed_amount = parse_amount(&record.billed_amount.as_text()).map_err(|e| format!("billed_amount: {}", e))?;
        let paid_amount = parse_amount(&record.paid_amount.as_text()).map_err(|e| format!("paid_amount: {}", e))?;
        let discharge_date = parse_date(&record.discharge_date).map_err(|e| format!("discharge_date: {}", e))?;
        Ok(ClaimImport {
            claim: NewClaim {
                claim_id: record.id,
                patient_name: record.patient_name,
                billed_amount,
                paid_amount,
                status: record.status,
                insurer_name: record.insurer_name,
                discharge_date,
            },
            cpt_codes: record.cpt_codes,
            denial_reason: record.denial_reason,
        })
    }
}

/// Parses a JSON array of claim objects, or one object per line. Every
/// record is checked before any is returned.
pub fn parse_claim_records(content: &str) -> Result<Vec<ClaimImport>> {
    let records: Vec<ClaimRecord> = if content.trim_start().starts_with('[') {
        serde_json::from_str(content)?
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| ClaimsError::InvalidData(format!("line {}: {}", index + 1, e)))
            })
            .collect::<Result<_>>()?
    };
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let claim_id = record.id;
            ClaimImport::try_from(record)
                .map_err(|reason| ClaimsError::InvalidData(format!("record {} (claim {}): {}", index + 1, claim_id, reason)))
        })
        .collect()
}

/// Creates or updates claims by business identifier. Rows carrying detail
/// fields also create or overwrite the claim's first detail.
pub async fn load_claims(storage: &dyn ClaimStorageEngine, path: &Path) -> Result<LoadReport> {
    let content = tokio::fs::read_to_string(path).await?;
    let imports = parse_claim_records(&content)?;
    debug!("Parsed {} claim records from {}", imports.len(), path.display());

    let mut report = LoadReport::default();
    for import in imports {
        let has_detail = import.has_detail();
        let (claim, created) = storage.upsert_claim(import.claim).await?;
        if has_detail {
            match storage.first_detail(claim.id).await? {
                Some(mut detail) => {
                    if let Some(codes) = import.cpt_codes {
                        detail.cpt_codes = codes;
                    }
                    if import.denial_reason.is_some() {
                        detail.denial_reason = import.denial_reason;
                    }
                    storage.update_detail(&detail).await?;
                }
                None => {
                    storage
                        .insert_detail(claim.id, import.denial_reason, import.cpt_codes.unwrap_or_default())
                        .await?;
                }
            }
        }
        if created {
            report.created += 1;
            info!("Created {}", claim);
        } else {
            report.updated += 1;
            info!("Updated {}", claim);
        }
    }
    storage.flush().await?;
    Ok(report)
}

/// Deletes all rows of a table and resets its id sequence.
pub async fn clear_table(storage: &dyn ClaimStorageEngine, table: Table) -> Result<usize> {
    let removed = storage.clear_table(table).await?;
    storage.flush().await?;
    info!("Table {} cleared ({} rows) and id sequence reset.", table, removed);
    Ok(removed)
}
