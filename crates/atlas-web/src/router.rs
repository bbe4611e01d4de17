//! Axum router — maps all URL paths to handlers.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{
    dashboard::dashboard,
    explore::{api_causal, api_cross_layer, api_novel, api_perturbation, api_search, api_svd, api_tracking},
    layers::{api_feature_detail, api_features, api_module_detail, api_modules, api_scatter, api_summary},
    system::api_status,
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let data_dir = state
        .config
        .server
        .serve_data_dir
        .then(|| state.config.data.local_dir.clone());
    let shared: SharedState = Arc::new(state);

    let router = Router::new()
        // Pages
        .route("/", get(dashboard))

        // Layer views
        .route("/api/summary",                          get(api_summary))
        .route("/api/layers/{layer}/features",          get(api_features))
        .route("/api/layers/{layer}/features/{id}",     get(api_feature_detail))
        .route("/api/layers/{layer}/scatter",           get(api_scatter))
        .route("/api/layers/{layer}/modules",           get(api_modules))
        .route("/api/layers/{layer}/modules/{id}",      get(api_module_detail))

        // Cross-cutting views
        .route("/api/search",             get(api_search))
        .route("/api/causal",             get(api_causal))
        .route("/api/perturbation",       get(api_perturbation))
        .route("/api/cross-layer/{pair}", get(api_cross_layer))
        .route("/api/svd",                get(api_svd))
        .route("/api/tracking",           get(api_tracking))
        .route("/api/novel/{layer}",      get(api_novel))

        .route("/api/status", get(api_status));

    // Artifact directory
    let router = match data_dir {
        Some(dir) => router.nest_service("/data", ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(shared)
}
