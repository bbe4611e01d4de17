//! Per-layer views: summary, feature table, scatter, feature detail, modules.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use atlas_views::detail::{feature_detail, DetailInputs};
use atlas_views::features::{query_features, FeatureQuery};
use atlas_views::modules::{layer_modules, module_detail};
use atlas_views::overview::layer_overview;
use atlas_views::scatter::{bounds, scatter_points};

use crate::error::ApiError;
use crate::state::SharedState;

/// GET /api/summary - Layer table, totals and ontology bars
pub async fn api_summary(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let summary = state.loader.global_summary().await?;
    Ok(Json(layer_overview(&summary)).into_response())
}

/// GET /api/layers/{layer}/features - Filtered, sorted feature table
pub async fn api_features(
    State(state): State<SharedState>,
    Path(layer): Path<u32>,
    Query(query): Query<FeatureQuery>,
) -> Result<Response, ApiError> {
    let features = state.loader.layer_features(layer).await?;
    let page = query_features(&features, &query);
    Ok(Json(json!({
        "layer": layer,
        "total": page.total,
        "features": page.features,
    }))
    .into_response())
}

/// GET /api/layers/{layer}/scatter - UMAP points joined with feature records
pub async fn api_scatter(
    State(state): State<SharedState>,
    Path(layer): Path<u32>,
) -> Result<Response, ApiError> {
    let (features, positions) = state.loader.layer_scatter_inputs(layer).await?;
    let points = scatter_points(&positions, &features);
    Ok(Json(json!({
        "layer": layer,
        "bounds": bounds(&points),
        "points": points,
    }))
    .into_response())
}

/// GET /api/layers/{layer}/features/{id} - Feature detail panel
pub async fn api_feature_detail(
    State(state): State<SharedState>,
    Path((layer, id)): Path<(u32, u32)>,
) -> Result<Response, ApiError> {
    let loader = &state.loader;
    let (features, annotations, modules, gene_index, cell_types) = tokio::try_join!(
        loader.layer_features(layer),
        loader.layer_annotations(layer),
        loader.modules(),
        loader.gene_index(),
        loader.layer_cell_types(layer),
    )?;

    let inputs = DetailInputs {
        features: &features,
        annotations: &annotations,
        cell_types: cell_types.as_deref(),
        modules: &modules,
        gene_index: &gene_index,
    };
    let detail = feature_detail(layer, id, inputs)
        .ok_or_else(|| ApiError::not_found(format!("feature {id} in layer {layer}")))?;
    Ok(Json(detail).into_response())
}

/// GET /api/layers/{layer}/modules - Modules of a layer, largest first
pub async fn api_modules(
    State(state): State<SharedState>,
    Path(layer): Path<u32>,
) -> Result<Response, ApiError> {
    state.loader.check_layer(layer)?;
    let modules = state.loader.modules().await?;
    Ok(Json(json!({
        "layer": layer,
        "modules": layer_modules(&modules, layer),
    }))
    .into_response())
}

/// GET /api/layers/{layer}/modules/{id} - Module with its member features
pub async fn api_module_detail(
    State(state): State<SharedState>,
    Path((layer, id)): Path<(u32, i32)>,
) -> Result<Response, ApiError> {
    let (modules, features) = tokio::try_join!(state.loader.modules(), state.loader.layer_features(layer))?;
    let detail = module_detail(&modules, layer, id, &features)
        .ok_or_else(|| ApiError::not_found(format!("module {id} in layer {layer}")))?;
    Ok(Json(detail).into_response())
}
