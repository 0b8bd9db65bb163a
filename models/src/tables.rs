// models/src/tables.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// The record store's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Claims,
    ClaimDetails,
    Notes,
    Flags,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Claims, Table::ClaimDetails, Table::Notes, Table::Flags];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Claims => "claims",
            Table::ClaimDetails => "claim_details",
            Table::Notes => "notes",
            Table::Flags => "flags",
        }
    }

    /// Tables whose rows reference this table and are removed with it.
    pub fn dependents(&self) -> &'static [Table] {
        match self {
            Table::Claims => &[Table::ClaimDetails, Table::Notes, Table::Flags],
            _ => &[],
        }
    }
}

impl FromStr for Table {
    type Err = ValidationError;

    /// Accepts plain table names as well as `app.Model` labels such as `claims.Note`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        let model = label.rsplit('.').next().unwrap_or(label).to_lowercase();
        match model.as_str() {
            "claims" | "claim" => Ok(Table::Claims),
            "claim_details" | "claimdetail" | "details" => Ok(Table::ClaimDetails),
            "notes" | "note" => Ok(Table::Notes),
            "flags" | "systemflag" | "system_flags" => Ok(Table::Flags),
            _ => Err(ValidationError::UnknownTable(label.to_string())),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
