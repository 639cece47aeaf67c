use std::time::Duration;

use async_trait::async_trait;
use models::ClaimsDocument;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, warn};

use super::ClaimStore;
use crate::errors::ServiceError;

/// Remote key-value store speaking the Upstash REST dialect.
///
/// The collection is stored as one serialized JSON string under a fixed key:
/// - `GET  {base}/get/{key}` returns `{"result": "<json>" | null}`
/// - `POST {base}/set/{key}` stores the request body
///
/// Both calls carry `Authorization: Bearer {token}`.
#[derive(Clone, Debug)]
pub struct KvClaimStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct KvGetResponse {
    result: Option<String>,
}

impl KvClaimStore {
    pub fn new(base_url: &str, token: &str, key: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::storage)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            key: key.to_string(),
        })
    }

    fn endpoint(&self, op: &str) -> String {
        format!("{}/{}/{}", self.base_url, op, self.key)
    }

    async fn fetch(&self) -> Result<ClaimsDocument, ServiceError> {
        let resp = self
            .client
            .get(self.endpoint("get"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ServiceError::storage)?;
        if !resp.status().is_success() {
            return Err(ServiceError::Storage(format!("kv get returned {}", resp.status())));
        }
        let body: KvGetResponse = resp.json().await.map_err(ServiceError::storage)?;
        match body.result {
            Some(raw) => serde_json::from_str(&raw).map_err(ServiceError::storage),
            None => Ok(ClaimsDocument::default()),
        }
    }
}

#[async_trait]
impl ClaimStore for KvClaimStore {
    async fn load(&self) -> ClaimsDocument {
        match self.fetch().await {
            Ok(doc) => {
                debug!(key = %self.key, claims = doc.claims.len(), "claims loaded from kv");
                doc
            }
            Err(e) => {
                warn!(key = %self.key, err = %e, "kv read failed; using empty collection");
                ClaimsDocument::default()
            }
        }
    }

    async fn save(&self, doc: &ClaimsDocument) -> Result<(), ServiceError> {
        let body = serde_json::to_string(doc).map_err(ServiceError::storage)?;
        let resp = self
            .client
            .post(self.endpoint("set"))
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(ServiceError::storage)?;
        if !resp.status().is_success() {
            return Err(ServiceError::Storage(format!("kv set returned {}", resp.status())));
        }
        debug!(key = %self.key, claims = doc.claims.len(), "claims saved to kv");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "kv"
    }
}
