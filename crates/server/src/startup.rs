use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};
use service::{
    auth::DemoAuthService,
    claims::ClaimService,
    clock::SystemClock,
    storage,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load and validate configuration (config.toml, then env overrides).
pub fn load_config() -> Result<AppConfig, StartupError> {
    AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Wire the store, clock and services described by `cfg` into handler state.
pub fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let store = storage::from_config(&cfg.storage)
        .map_err(|e| StartupError::Runtime(e.to_string()))?;
    let claims = ClaimService::new(store, Arc::new(SystemClock))
        .with_auto_approve_after(Duration::from_millis(cfg.claims.auto_approve_after_ms));
    Ok(ServerState {
        claims: Arc::new(claims),
        auth: Arc::new(DemoAuthService::new(cfg.auth.clone())),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(err = %e, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received; draining connections");
}

/// Serve `cfg` until ctrl-c, letting in-flight requests finish.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(&cfg.server.frontend_dir, &cfg.storage.data_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let state = build_state(&cfg)?;
    info!(
        backend = state.claims.store().backend(),
        auto_approve_after_ms = cfg.claims.auto_approve_after_ms,
        "claim service ready"
    );

    // Build router
    let app: Router = routes::build_router(state, build_cors(), &cfg.server.frontend_dir);

    // Bind and serve
    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting claims server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
