// lib/src/errors.rs

use bincode::error::{DecodeError, EncodeError};
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use models::errors::FieldErrors;

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// A store write failed part way through an edit. Mirror files must not be
    /// assumed to reflect the attempted change.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization/Deserialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input or data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Bincode decode error: {0}")]
    BincodeDecode(#[from] DecodeError),

    #[error("Bincode encode error: {0}")]
    BincodeEncode(#[from] EncodeError),

    #[error("JSON serialization/deserialization error: {0}")]
    JsonError(#[from] SerdeJsonError),
}

pub type Result<T> = std::result::Result<T, ClaimsError>;

impl ClaimsError {
    pub fn claim_not_found(id: u64) -> Self {
        ClaimsError::NotFound(format!("claim with id {} does not exist", id))
    }

    /// Re-labels a store failure that happened while persisting an edit.
    pub fn into_persistence(self, what: &str) -> Self {
        match self {
            ClaimsError::Persistence(_) => self,
            other => ClaimsError::Persistence(format!("{}: {}", what, other)),
        }
    }
}

impl From<sled::Error> for ClaimsError {
    fn from(err: sled::Error) -> Self {
        ClaimsError::DatabaseError(err.to_string())
    }
}

impl From<config::ConfigError> for ClaimsError {
    fn from(err: config::ConfigError) -> Self {
        ClaimsError::ConfigurationError(err.to_string())
    }
}

/// Failure while keeping a mirror file in step with the store. These are
/// reported and logged by the orchestrator, never returned to its caller.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("mirror file {path} could not be accessed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mirror file {path} line {line} is not a JSON object: {reason}")]
    MalformedRecord { path: String, line: usize, reason: String },

    #[error("mirror file {path} has no header row or lacks key column '{key}'")]
    MalformedHeader { path: String, key: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::errors::ValidationError;

    #[test]
    fn should_keep_persistence_errors_as_is() {
        let err = ClaimsError::Persistence("claim write".to_string()).into_persistence("detail");
        assert_eq!(err.to_string(), "Persistence failed: claim write");

        let err = ClaimsError::DatabaseError("disk full".to_string()).into_persistence("saving claim 7");
        assert_eq!(err.to_string(), "Persistence failed: saving claim 7: Database operation failed: disk full");
    }

    #[test]
    fn should_wrap_field_errors() {
        let err: ClaimsError = FieldErrors::single("status", ValidationError::Required).into();
        assert_eq!(err.to_string(), "Validation failed: status: this field is required");
    }
}
