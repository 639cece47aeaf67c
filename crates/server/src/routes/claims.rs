use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{
    claim::{ClaimInput, EvidenceInput},
    Claim, ClaimsDocument, Evidence,
};
use serde::{de::DeserializeOwned, Deserialize};
use service::claims::ClaimReceipt;
use tracing::warn;
use uuid::Uuid;

use super::ServerState;
use crate::errors::JsonApiError;

/// PATCH body. A missing or non-string `status` is reported as invalid.
#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

/// Bodies are read as JSON whatever the Content-Type header says.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Ids that are not UUIDs cannot name a stored claim.
fn claim_id(raw: &str) -> Result<Uuid, JsonApiError> {
    Uuid::parse_str(raw).map_err(|_| JsonApiError::new(StatusCode::NOT_FOUND, "Claim not found"))
}

#[utoipa::path(post, path = "/claims", tag = "claims", request_body = crate::openapi::CreateClaimRequest, responses((status = 201, description = "Created", body = crate::openapi::ClaimReceiptDoc), (status = 400, description = "Missing required fields or invalid body", body = crate::openapi::ErrorDoc)))]
pub async fn create(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ClaimReceipt>), JsonApiError> {
    let input: ClaimInput = parse_body(&body).map_err(|e| {
        warn!(err = %e, "claim submission body rejected");
        JsonApiError::bad_request("Invalid request body")
    })?;
    let receipt = state.claims.create(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(get, path = "/claims", tag = "claims", responses((status = 200, description = "All claims", body = crate::openapi::ClaimsDocumentDoc)))]
pub async fn list(State(state): State<ServerState>) -> Json<ClaimsDocument> {
    Json(state.claims.list().await)
}

#[utoipa::path(get, path = "/claims/{id}", tag = "claims", params(("id" = String, Path, description = "Claim id")), responses((status = 200, description = "Claim, auto-approved if due", body = crate::openapi::ClaimDoc), (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)))]
pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Claim>, JsonApiError> {
    let claim = state.claims.get(claim_id(&id)?).await?;
    Ok(Json(claim))
}

#[utoipa::path(patch, path = "/claims/{id}", tag = "claims", params(("id" = String, Path, description = "Claim id")), request_body = crate::openapi::StatusUpdateRequest, responses((status = 200, description = "Updated claim", body = crate::openapi::ClaimDoc), (status = 400, description = "Invalid status", body = crate::openapi::ErrorDoc), (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)))]
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Claim>, JsonApiError> {
    let id = claim_id(&id)?;
    // unreadable body counts as `{}` and fails status validation
    let update: StatusUpdate = parse_body(&body).unwrap_or_default();
    let claim = state
        .claims
        .update_status(id, update.status.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(claim))
}

#[utoipa::path(get, path = "/claims/{id}/evidence", tag = "evidence", params(("id" = String, Path, description = "Claim id")), responses((status = 200, description = "Evidence in attach order", body = [crate::openapi::EvidenceDoc]), (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)))]
pub async fn list_evidence(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Evidence>>, JsonApiError> {
    let evidence = state.claims.list_evidence(claim_id(&id)?).await?;
    Ok(Json(evidence))
}

#[utoipa::path(post, path = "/claims/{id}/evidence", tag = "evidence", params(("id" = String, Path, description = "Claim id")), request_body = crate::openapi::EvidenceRequest, responses((status = 201, description = "Updated claim", body = crate::openapi::ClaimDoc), (status = 400, description = "url is required", body = crate::openapi::ErrorDoc), (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)))]
pub async fn add_evidence(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Claim>), JsonApiError> {
    let id = claim_id(&id)?;
    let input: EvidenceInput = parse_body(&body).unwrap_or_default();
    let claim = state.claims.add_evidence(id, input).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}
