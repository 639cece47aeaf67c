use std::path::{Path, PathBuf};

use async_trait::async_trait;
use models::ClaimsDocument;
use tokio::fs;
use tracing::{debug, warn};

use super::ClaimStore;
use crate::errors::ServiceError;

pub const CLAIMS_FILE_NAME: &str = "claims.json";

/// Local JSON file holding the whole collection, pretty-printed.
///
/// The parent directory is created on demand; a missing file is created
/// with an empty collection on first load.
#[derive(Clone, Debug)]
pub struct JsonFileClaimStore {
    file_path: PathBuf,
}

impl JsonFileClaimStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into() }
    }

    /// `<dir>/claims.json`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(CLAIMS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Sibling file the next document is written to before it replaces the
    /// live one.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.file_path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn ensure_parent(&self) -> Result<(), ServiceError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
            }
        }
        Ok(())
    }

    async fn write(&self, doc: &ClaimsDocument) -> Result<(), ServiceError> {
        self.ensure_parent().await?;
        let data = serde_json::to_vec_pretty(doc).map_err(ServiceError::storage)?;
        // same directory, so the rename is atomic
        let staging = self.staging_path();
        fs::write(&staging, data).await.map_err(ServiceError::storage)?;
        fs::rename(&staging, &self.file_path).await.map_err(ServiceError::storage)?;
        Ok(())
    }

    async fn read_or_init(&self) -> Result<ClaimsDocument, ServiceError> {
        self.ensure_parent().await?;
        match fs::read(&self.file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(ServiceError::storage),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = ClaimsDocument::default();
                self.write(&empty).await?;
                Ok(empty)
            }
            Err(e) => Err(ServiceError::storage(e)),
        }
    }
}

#[async_trait]
impl ClaimStore for JsonFileClaimStore {
    async fn load(&self) -> ClaimsDocument {
        match self.read_or_init().await {
            Ok(doc) => {
                debug!(path = %self.file_path.display(), claims = doc.claims.len(), "claims loaded");
                doc
            }
            Err(e) => {
                warn!(path = %self.file_path.display(), err = %e, "claims file unreadable; using empty collection");
                ClaimsDocument::default()
            }
        }
    }

    async fn save(&self, doc: &ClaimsDocument) -> Result<(), ServiceError> {
        self.write(doc).await?;
        debug!(path = %self.file_path.display(), claims = doc.claims.len(), "claims saved");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
