//! SAE Atlas web server
//!
//! Run with: cargo run -p atlas-web --bin sae-atlas

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atlas_common::{AtlasConfig, Dataset};
use atlas_web::{router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AtlasConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("Starting SAE Atlas v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_config(config.clone())?;
    let loader = state.loader.clone();
    let app = build_router(state);

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    // Warm the summary once the listener is up; the data route may be ours
    tokio::spawn(async move {
        for (dataset, result) in loader.prefetch(&[Dataset::GlobalSummary]).await {
            if let Err(e) = result {
                warn!(%dataset, error = %e, "Startup prefetch failed");
            }
        }
    });

    axum::serve(listener, app).await?;
    Ok(())
}
