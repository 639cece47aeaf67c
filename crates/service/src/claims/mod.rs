//! Claim lifecycle: submission, lazy auto-approve on read, administrative
//! review and evidence attachment.

pub mod service;

pub use service::{ClaimReceipt, ClaimService, DEFAULT_AUTO_APPROVE_AFTER};
