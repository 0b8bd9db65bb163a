// models/src/medical/mod.rs

pub mod claim;
pub mod claim_detail;
pub mod note;
pub mod system_flag;

pub use claim::{Claim, NewClaim};
pub use claim_detail::ClaimDetail;
pub use note::Note;
pub use system_flag::{SystemFlag, DEFAULT_FLAG_MESSAGE, MAX_FLAG_MESSAGE_LEN};
