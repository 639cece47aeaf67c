//! Storage abstractions for the claim collection
//!
//! The whole collection is the unit of persistence: callers `load` it,
//! mutate it in memory, and `save` it back. Backends never merge.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use configs::StorageConfig;
use models::ClaimsDocument;
use tracing::info;

use crate::errors::ServiceError;

pub mod json_file_store;
pub mod kv_store;
pub mod memory_store;

pub use json_file_store::JsonFileClaimStore;
pub use kv_store::KvClaimStore;
pub use memory_store::MemoryClaimStore;

/// Whole-collection claim persistence.
///
/// `load` is fail-soft: a missing, unreadable or unparsable collection
/// comes back empty instead of erroring. `save` overwrites everything.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn load(&self) -> ClaimsDocument;
    async fn save(&self, doc: &ClaimsDocument) -> Result<(), ServiceError>;
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Pick the backend once at startup: remote key-value when both URL and
/// token are configured, the local JSON file otherwise.
pub fn from_config(cfg: &StorageConfig) -> Result<Arc<dyn ClaimStore>, ServiceError> {
    let store: Arc<dyn ClaimStore> = match cfg.kv_credentials() {
        Some((url, token)) => Arc::new(KvClaimStore::new(
            url,
            token,
            &cfg.kv_key,
            Duration::from_secs(cfg.kv_timeout_secs),
        )?),
        None => Arc::new(JsonFileClaimStore::in_dir(&cfg.data_dir)),
    };
    info!(backend = store.backend(), "claim store selected");
    Ok(store)
}
