use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use models::ClaimsDocument;
use tokio::sync::RwLock;

use super::ClaimStore;
use crate::errors::ServiceError;

/// In-process collection for tests; counts saves so callers can assert
/// that a rejected operation persisted nothing.
#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    inner: RwLock<ClaimsDocument>,
    saves: AtomicUsize,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: ClaimsDocument) -> Self {
        Self { inner: RwLock::new(doc), saves: AtomicUsize::new(0) }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> ClaimsDocument {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn load(&self) -> ClaimsDocument {
        self.inner.read().await.clone()
    }

    async fn save(&self, doc: &ClaimsDocument) -> Result<(), ServiceError> {
        *self.inner.write().await = doc.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
