//! Claim records and the rules they obey.
//! - Plain data types persisted as one JSON document.
//! - Pure lifecycle helpers (confirmation numbers, lazy auto-approve).

pub mod claim;
pub mod errors;

pub use claim::{Claim, ClaimStatus, ClaimsDocument, Evidence};
