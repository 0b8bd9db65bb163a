// models/src/lib.rs
// Shared domain types for claimdesk: claims and their child records, the
// edit form with its merge modes, and the flat row shape used by mirror files.

pub mod errors;
pub mod forms;
pub mod medical;
pub mod merge;
pub mod mirror_row;
pub mod tables;

pub use errors::{FieldError, FieldErrors, ValidationError, ValidationResult};
pub use forms::{ClaimEditForm, ValidatedClaimEdit};
pub use medical::{Claim, ClaimDetail, NewClaim, Note, SystemFlag};
pub use merge::{MergeField, MergeMode};
pub use mirror_row::{DetailRow, MirrorRow, ToMirrorRow};
pub use tables::Table;
