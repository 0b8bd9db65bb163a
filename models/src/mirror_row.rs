// models/src/mirror_row.rs

use crate::medical::claim_detail::{ClaimDetail, CLAIM_DETAIL_KEY};

/// A flattened, stringified view of an entity as it appears in a mirror file.
///
/// The key column holds the business identifier; `fields` are the mutable
/// columns in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRow {
    key_field: &'static str,
    key: String,
    fields: Vec<(&'static str, String)>,
}

impl MirrorRow {
    pub fn new(key_field: &'static str, key: String) -> Self {
        MirrorRow { key_field, key, fields: Vec::new() }
    }

    pub fn add_field(&mut self, name: &'static str, value: &str) {
        self.fields.push((name, value.to_string()));
    }

    pub fn key_field(&self) -> &'static str {
        self.key_field
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Value of a mutable field, or of the key column.
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == self.key_field {
            return Some(&self.key);
        }
        self.fields.iter().find(|(field, _)| *field == name).map(|(_, value)| value.as_str())
    }
}

pub trait ToMirrorRow {
    fn to_mirror_row(&self) -> MirrorRow;
}

/// A claim detail paired with its owning claim's business identifier, which
/// is what detail mirror rows are keyed by.
#[derive(Debug, Clone, Copy)]
pub struct DetailRow<'a> {
    pub detail: &'a ClaimDetail,
    pub claim_id: i64,
}

impl ToMirrorRow for DetailRow<'_> {
    fn to_mirror_row(&self) -> MirrorRow {
        let mut row = MirrorRow::new(CLAIM_DETAIL_KEY, self.claim_id.to_string());
        row.add_field("denial_reason", self.detail.denial_reason.as_deref().unwrap_or(""));
        row.add_field("cpt_codes", &self.detail.cpt_codes);
        row
    }
}
