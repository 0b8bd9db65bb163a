// models/src/merge.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// How an edited value combines with the value already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    #[default]
    Overwrite,
    Append,
}

impl MergeMode {
    /// Lenient parse used for form input: case-insensitive, surrounding
    /// whitespace ignored, anything unrecognised (including blank) is `Overwrite`.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("append") {
            MergeMode::Append
        } else {
            MergeMode::Overwrite
        }
    }
}

impl FromStr for MergeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(MergeMode::Overwrite),
            "append" => Ok(MergeMode::Append),
            other => Err(format!("unknown merge mode '{}', expected overwrite or append", other)),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MergeMode::Overwrite => write!(f, "overwrite"),
            MergeMode::Append => write!(f, "append"),
        }
    }
}

impl<'de> Deserialize<'de> for MergeMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|value| MergeMode::parse_lenient(&value)).unwrap_or_default())
    }
}

/// Claim detail fields that support merge modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeField {
    DenialReason,
    CptCodes,
}

impl MergeField {
    /// Separator placed between the stored value and an appended one.
    pub fn append_separator(&self) -> &'static str {
        match self {
            MergeField::DenialReason => ". ",
            MergeField::CptCodes => ",",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MergeField::DenialReason => "denial_reason",
            MergeField::CptCodes => "cpt_codes",
        }
    }
}
