// models/src/errors.rs

use std::fmt;

pub use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The field is required and was missing or blank.
    #[error("this field is required")]
    Required,
    /// The value exceeds the column's maximum length.
    #[error("ensure this value has at most {max} characters (it has {actual})")]
    TooLong { max: usize, actual: usize },
    /// The value could not be parsed as a number.
    #[error("enter a number, got '{0}'")]
    InvalidNumber(String),
    /// The value has more decimal places than the column allows.
    #[error("ensure that there are no more than {0} decimal places")]
    TooManyDecimalPlaces(u32),
    /// The value has more digits before the decimal point than the column allows.
    #[error("ensure that there are no more than {0} digits before the decimal point")]
    TooManyWholeDigits(u32),
    /// An invalid date format was provided.
    #[error("invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),
    /// The submitted business identifier does not belong to the claim being edited.
    #[error("claim number {submitted} does not match claim {expected}")]
    IdentifierMismatch { expected: i64, submitted: String },
    /// A table label that names no known table.
    #[error("unknown table '{0}'")]
    UnknownTable(String),
}

/// A validation failure attached to the form field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub error: ValidationError,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Every field-level failure collected while validating one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.push(field, error);
        errors
    }

    pub fn push(&mut self, field: &str, error: ValidationError) {
        self.errors.push(FieldError { field: field.to_string(), error });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns the error recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field).map(|e| &e.error)
    }

    /// Converts the collection into a `Result`, failing when anything was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
