//! Service layer for the claims portal.
//! - `storage`: whole-collection persistence behind one trait.
//! - `claims`: lifecycle operations (create, read with auto-approve, review, evidence).
//! - `auth`: the demo credential check behind the session cookie.

pub mod errors;
pub mod auth;
pub mod claims;
pub mod clock;
pub mod storage;
