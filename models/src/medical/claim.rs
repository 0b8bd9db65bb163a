// models/src/medical/claim.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::mirror_row::{MirrorRow, ToMirrorRow};

/// Mirror key column for claim list rows.
pub const CLAIM_LIST_KEY: &str = "id";

/// A claim as held by the record store.
///
/// `id` is the store's surrogate key; `claim_id` is the business identifier
/// used to join store rows with mirror file rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: u64,
    pub claim_id: i64,
    pub patient_name: String,
    pub billed_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: String,
    pub insurer_name: String,
    pub discharge_date: NaiveDate,
}

/// Claim fields before the store has assigned a surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClaim {
    pub claim_id: i64,
    pub patient_name: String,
    pub billed_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: String,
    pub insurer_name: String,
    pub discharge_date: NaiveDate,
}

impl NewClaim {
    pub fn into_claim(self, id: u64) -> Claim {
        Claim {
            id,
            claim_id: self.claim_id,
            patient_name: self.patient_name,
            billed_amount: self.billed_amount,
            paid_amount: self.paid_amount,
            status: self.status,
            insurer_name: self.insurer_name,
            discharge_date: self.discharge_date,
        }
    }
}

impl Claim {
    /// Amount billed but not yet paid.
    pub fn outstanding(&self) -> Decimal {
        self.billed_amount - self.paid_amount
    }
}

impl ToMirrorRow for Claim {
    fn to_mirror_row(&self) -> MirrorRow {
        let mut row = MirrorRow::new(CLAIM_LIST_KEY, self.claim_id.to_string());
        row.add_field("patient_name", &self.patient_name);
        row.add_field("billed_amount", &self.billed_amount.to_string());
        row.add_field("paid_amount", &self.paid_amount.to_string());
        row.add_field("status", &self.status);
        row.add_field("insurer_name", &self.insurer_name);
        row.add_field("discharge_date", &self.discharge_date.format("%Y-%m-%d").to_string());
        row
    }
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Claim {} - {}", self.claim_id, self.patient_name)
    }
}
