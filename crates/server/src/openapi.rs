use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorDoc { pub error: String }

#[derive(ToSchema)]
pub struct CreateClaimRequest {
    pub policyholder_name: String,
    pub policyholder_email: String,
    pub policyholder_phone: Option<String>,
    /// e.g. `2024-01-01`
    pub incident_date: String,
    pub vehicle_info: String,
    /// Defaults to `other`
    pub incident_type: Option<String>,
    pub damage_description: String,
    pub vin_visible: Option<bool>,
    pub plate_visible: Option<bool>,
    pub airbag_deployed: Option<bool>,
    pub warning_lights: Option<bool>,
    /// `yes`, `no` or `unknown` (default)
    pub drivability: Option<String>,
}

#[derive(ToSchema)]
pub struct ClaimReceiptDoc {
    pub id: String,
    /// `CLM-` followed by 8 characters from `A-Z2-9` without `I`/`O`
    pub confirmation_number: String,
}

#[derive(ToSchema)]
pub struct EvidenceDoc {
    pub url: String,
    pub label: String,
    pub added_at: String,
}

#[derive(ToSchema)]
pub struct ClaimDoc {
    pub id: String,
    pub confirmation_number: String,
    /// `under_review`, `approved` or `denied`
    pub status: String,
    pub submitted_at: String,
    pub policyholder_name: String,
    pub policyholder_email: String,
    pub policyholder_phone: String,
    pub incident_date: String,
    pub vehicle_info: String,
    pub incident_type: String,
    pub damage_description: String,
    pub vin_visible: bool,
    pub plate_visible: bool,
    pub airbag_deployed: bool,
    pub warning_lights: bool,
    pub drivability: String,
    pub evidence: Vec<EvidenceDoc>,
}

#[derive(ToSchema)]
pub struct ClaimsDocumentDoc { pub claims: Vec<ClaimDoc> }

#[derive(ToSchema)]
pub struct StatusUpdateRequest {
    /// `approved`, `denied` or `under_review`
    pub status: String,
}

#[derive(ToSchema)]
pub struct EvidenceRequest {
    pub url: String,
    /// Defaults to `EVIDENCE`
    pub label: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct SessionDoc { pub authenticated: bool }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::claims::create,
        crate::routes::claims::list,
        crate::routes::claims::get,
        crate::routes::claims::update_status,
        crate::routes::claims::list_evidence,
        crate::routes::claims::add_evidence,
        crate::routes::auth::login,
        crate::routes::auth::session,
        crate::routes::auth::logout,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorDoc,
            CreateClaimRequest,
            ClaimReceiptDoc,
            EvidenceDoc,
            ClaimDoc,
            ClaimsDocumentDoc,
            StatusUpdateRequest,
            EvidenceRequest,
            LoginRequest,
            SessionDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "claims", description = "Claim intake and review"),
        (name = "evidence", description = "Proof clips attached to claims"),
        (name = "auth", description = "Demo login"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_claim_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for p in ["/claims", "/claims/{id}", "/claims/{id}/evidence", "/auth/login", "/auth/session", "/auth/logout", "/health"] {
            assert!(paths.iter().any(|k| k == p), "missing {p}");
        }
    }
}
