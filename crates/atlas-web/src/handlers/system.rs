//! Loader and cache status.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use atlas_data::CacheStats;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub source: String,
    pub n_layers: u32,
    pub causal_layer: u32,
    pub uptime_secs: i64,
    pub cache: CacheStats,
}

/// GET /api/status - Data source and cache contents
pub async fn api_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let loader = &state.loader;
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        source: loader.source_description(),
        n_layers: loader.n_layers(),
        causal_layer: loader.causal_layer(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        cache: loader.cache_stats().await,
    })
}
