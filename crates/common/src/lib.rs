//! Cross-cutting helpers shared by the service and server crates.

pub mod types;
pub mod utils;
pub mod env;
