use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::{auth::DemoAuthService, claims::ClaimService};

use crate::openapi::ApiDoc;

pub mod auth;
pub mod claims;

/// Shared handler state: the claim lifecycle and the demo login.
#[derive(Clone)]
pub struct ServerState {
    pub claims: Arc<ClaimService>,
    pub auth: Arc<DemoAuthService>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: claims API, demo auth, docs and the
/// static frontend fallback.
pub fn build_router(state: ServerState, cors: CorsLayer, frontend_dir: &str) -> Router {
    let index = format!("{}/index.html", frontend_dir.trim_end_matches('/'));
    let static_dir = ServeDir::new(frontend_dir).fallback(ServeFile::new(index));

    let api = Router::new()
        .route("/health", get(health))
        .route("/claims", get(claims::list).post(claims::create))
        .route("/claims/:id", get(claims::get).patch(claims::update_status))
        .route(
            "/claims/:id/evidence",
            get(claims::list_evidence).post(claims::add_evidence),
        )
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::session))
        .route("/auth/logout", post(auth::logout))
        .with_state(state);

    // Compose
    api.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_dir)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
