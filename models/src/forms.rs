// models/src/forms.rs

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ValidationError, ValidationResult};
use crate::medical::Claim;
use crate::merge::MergeMode;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_STATUS_LEN: usize = 50;
pub const MAX_CPT_CODES_LEN: usize = 255;
pub const AMOUNT_MAX_DIGITS: u32 = 15;
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Raw edit input for one claim, as submitted by an operator.
///
/// The five direct fields always overwrite. `cpt_codes` and `denial_reason`
/// combine with the stored detail according to their paired mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEditForm {
    pub claim_id: String,
    pub patient_name: String,
    pub billed_amount: String,
    pub paid_amount: String,
    pub status: String,
    pub insurer_name: String,
    pub discharge_date: String,
    #[serde(default)]
    pub cpt_codes: Option<String>,
    #[serde(default)]
    pub denial_reason: Option<String>,
    #[serde(default)]
    pub cpt_mode: MergeMode,
    #[serde(default)]
    pub denial_mode: MergeMode,
}

/// A form that passed validation, with typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedClaimEdit {
    pub patient_name: String,
    pub billed_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: String,
    pub insurer_name: String,
    pub discharge_date: NaiveDate,
    pub cpt_codes: Option<String>,
    pub denial_reason: Option<String>,
    pub cpt_mode: MergeMode,
    pub denial_mode: MergeMode,
}

impl ClaimEditForm {
    /// Prefills the direct fields from a stored claim. Merge fields start empty,
    /// so submitting the form unchanged leaves the detail untouched.
    pub fn from_claim(claim: &Claim) -> Self {
        ClaimEditForm {
            claim_id: claim.claim_id.to_string(),
            patient_name: claim.patient_name.clone(),
            billed_amount: claim.billed_amount.to_string(),
            paid_amount: claim.paid_amount.to_string(),
            status: claim.status.clone(),
            insurer_name: claim.insurer_name.clone(),
            discharge_date: claim.discharge_date.format("%Y-%m-%d").to_string(),
            ..Default::default()
        }
    }

    /// Validates every field against the claim it targets, collecting all failures.
    pub fn validate(&self, expected_claim_id: i64) -> Result<ValidatedClaimEdit, FieldErrors> {
        let mut errors = FieldErrors::new();

        match self.claim_id.trim() {
            "" => errors.push("claim_id", ValidationError::Required),
            raw => match raw.parse::<i64>() {
                Ok(id) if id == expected_claim_id => {}
                Ok(_) => errors.push(
                    "claim_id",
                    ValidationError::IdentifierMismatch {
                        expected: expected_claim_id,
                        submitted: raw.to_string(),
                    },
                ),
                Err(_) => errors.push("claim_id", ValidationError::InvalidNumber(raw.to_string())),
            },
        }

        let patient_name = collect(&mut errors, "patient_name", required_text(&self.patient_name, MAX_NAME_LEN));
        let status = collect(&mut errors, "status", required_text(&self.status, MAX_STATUS_LEN));
        let insurer_name = collect(&mut errors, "insurer_name", required_text(&self.insurer_name, MAX_NAME_LEN));
        let billed_amount = collect(&mut errors, "billed_amount", parse_amount(&self.billed_amount));
        let paid_amount = collect(&mut errors, "paid_amount", parse_amount(&self.paid_amount));
        let discharge_date = collect(&mut errors, "discharge_date", parse_date(&self.discharge_date));

        let cpt_codes = optional_text(self.cpt_codes.as_deref());
        if let Some(codes) = &cpt_codes {
            let len = codes.chars().count();
            if len > MAX_CPT_CODES_LEN {
                errors.push("cpt_codes", ValidationError::TooLong { max: MAX_CPT_CODES_LEN, actual: len });
            }
        }

        match (patient_name, status, insurer_name, billed_amount, paid_amount, discharge_date) {
            (Some(patient_name), Some(status), Some(insurer_name), Some(billed_amount), Some(paid_amount), Some(discharge_date)) => {
                errors.into_result(ValidatedClaimEdit {
                    patient_name,
                    billed_amount,
                    paid_amount,
                    status,
                    insurer_name,
                    discharge_date,
                    cpt_codes,
                    denial_reason: optional_text(self.denial_reason.as_deref()),
                    cpt_mode: self.cpt_mode,
                    denial_mode: self.denial_mode,
                })
            }
            _ => Err(errors),
        }
    }
}

impl ValidatedClaimEdit {
    /// Whether the submission touches the claim detail at all.
    pub fn touches_detail(&self) -> bool {
        self.cpt_codes.is_some() || self.denial_reason.is_some()
    }
}

fn collect<T>(errors: &mut FieldErrors, field: &str, result: ValidationResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(field, e);
            None
        }
    }
}

fn required_text(value: &str, max: usize) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required);
    }
    let actual = trimmed.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { max, actual });
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Parses a money amount with at most 15 digits, 2 of them after the point.
pub fn parse_amount(value: &str) -> ValidationResult<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required);
    }
    let amount = Decimal::from_str(trimmed).map_err(|_| ValidationError::InvalidNumber(trimmed.to_string()))?;
    if amount.scale() > AMOUNT_DECIMAL_PLACES {
        return Err(ValidationError::TooManyDecimalPlaces(AMOUNT_DECIMAL_PLACES));
    }
    let whole_digits = amount.abs().trunc().to_string().trim_start_matches('0').len() as u32;
    let max_whole = AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES;
    if whole_digits > max_whole {
        return Err(ValidationError::TooManyWholeDigits(max_whole));
    }
    Ok(amount)
}

/// Parses an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(value: &str) -> ValidationResult<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDateFormat(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ClaimEditForm {
        ClaimEditForm {
            claim_id: "42".to_string(),
            patient_name: "jane doe".to_string(),
            billed_amount: "1200.50".to_string(),
            paid_amount: "0".to_string(),
            status: "denied".to_string(),
            insurer_name: "acme health".to_string(),
            discharge_date: "2024-03-09".to_string(),
            cpt_codes: Some(" 99214 ".to_string()),
            denial_reason: Some("   ".to_string()),
            cpt_mode: MergeMode::Append,
            denial_mode: MergeMode::Overwrite,
        }
    }

    #[test]
    fn should_accept_valid_form() {
        let edit = form().validate(42).unwrap();
        assert_eq!(edit.billed_amount, Decimal::from_str("1200.50").unwrap());
        assert_eq!(edit.discharge_date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(edit.cpt_codes.as_deref(), Some("99214"));
        assert_eq!(edit.denial_reason, None);
        assert!(edit.touches_detail());
    }

    #[test]
    fn should_collect_every_invalid_field() {
        let mut bad = form();
        bad.claim_id = "".to_string();
        bad.billed_amount = "twelve".to_string();
        bad.paid_amount = "1.234".to_string();
        bad.discharge_date = "03/09/2024".to_string();
        bad.patient_name = " ".to_string();
        let errors = bad.validate(42).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors.get("claim_id"), Some(&ValidationError::Required));
        assert_eq!(errors.get("billed_amount"), Some(&ValidationError::InvalidNumber("twelve".to_string())));
        assert_eq!(errors.get("paid_amount"), Some(&ValidationError::TooManyDecimalPlaces(2)));
        assert!(matches!(errors.get("discharge_date"), Some(ValidationError::InvalidDateFormat(_))));
        assert_eq!(errors.get("patient_name"), Some(&ValidationError::Required));
    }

    #[test]
    fn should_reject_foreign_business_identifier() {
        let errors = form().validate(7).unwrap_err();
        assert_eq!(
            errors.get("claim_id"),
            Some(&ValidationError::IdentifierMismatch { expected: 7, submitted: "42".to_string() })
        );
    }

    #[test]
    fn should_limit_whole_digits_of_amounts() {
        assert!(parse_amount("9999999999999.99").is_ok());
        assert_eq!(parse_amount("10000000000000"), Err(ValidationError::TooManyWholeDigits(13)));
        assert_eq!(parse_amount("0.5").unwrap(), Decimal::from_str("0.5").unwrap());
    }

    #[test]
    fn should_prefill_from_claim() {
        let claim = Claim {
            id: 1,
            claim_id: 42,
            patient_name: "Jane Doe".to_string(),
            billed_amount: Decimal::from_str("10.00").unwrap(),
            paid_amount: Decimal::from_str("5.00").unwrap(),
            status: "Paid".to_string(),
            insurer_name: "Acme".to_string(),
            discharge_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };
        let prefilled = ClaimEditForm::from_claim(&claim);
        assert_eq!(prefilled.discharge_date, "2024-01-02");
        let edit = prefilled.validate(42).unwrap();
        assert!(!edit.touches_detail());
        assert_eq!(edit.paid_amount, claim.paid_amount);
    }
}
