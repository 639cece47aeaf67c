//! Startup bootstrap for the claims data directory and the optional portal pages.

use anyhow::Context;
use tracing::{info, warn};

/// Create the claims data directory if needed. The portal's static pages are
/// optional: without them only the JSON API is served.
pub async fn ensure_env(frontend_dir: &str, data_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(frontend_dir).await.is_err() {
        warn!(%frontend_dir, "portal pages not found; serving the claims API only");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("cannot create claims data directory {data_dir}"))?;
    info!(%data_dir, "claims data directory ready");
    Ok(())
}
