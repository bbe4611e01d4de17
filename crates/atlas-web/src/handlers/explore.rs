//! Cross-layer and whole-atlas views: search, causal and perturbation
//! rankings, dependency lookups, baseline comparison, tracking and novel
//! clusters.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use atlas_common::artifacts::LayerPair;
use atlas_views::baseline::svd_rows;
use atlas_views::causal::{rank_causal, CausalSort};
use atlas_views::cross_layer::{dependency_lookup, DependencyQuery};
use atlas_views::perturbation::{rank_perturbations, PerturbationQuery};
use atlas_views::search::{search, DEFAULT_SEARCH_LIMIT};

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CausalParams {
    pub sort: CausalSort,
    pub limit: Option<usize>,
}

/// GET /api/search?q= - Gene and ontology-term search
pub async fn api_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let (genes, terms) = tokio::try_join!(state.loader.gene_index(), state.loader.ontology_index())?;
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Ok(Json(search(&genes, &terms, &params.q, limit)).into_response())
}

/// GET /api/causal - Causal patching ranking on the designated layer
pub async fn api_causal(
    State(state): State<SharedState>,
    Query(params): Query<CausalParams>,
) -> Result<Response, ApiError> {
    let layer = state.loader.causal_layer();
    let (patching, features) = tokio::try_join!(
        state.loader.causal_patching(),
        state.loader.layer_features(layer),
    )?;
    let rows = rank_causal(&patching, &features, params.sort, params.limit);
    Ok(Json(json!({
        "layer": layer,
        "summary": patching.summary,
        "features": rows,
    }))
    .into_response())
}

/// GET /api/perturbation - Perturbation targets by specific response
pub async fn api_perturbation(
    State(state): State<SharedState>,
    Query(query): Query<PerturbationQuery>,
) -> Result<Response, ApiError> {
    let response = state.loader.perturbation_response().await?;
    Ok(Json(json!({
        "layer": state.loader.causal_layer(),
        "summary": response.summary,
        "targets": rank_perturbations(&response, &query),
    }))
    .into_response())
}

/// GET /api/cross-layer/{pair} - Dependencies between two layers
pub async fn api_cross_layer(
    State(state): State<SharedState>,
    Path(pair): Path<String>,
    Query(query): Query<DependencyQuery>,
) -> Result<Response, ApiError> {
    let pair: LayerPair = pair.parse().map_err(ApiError::BadRequest)?;
    let graph = state.loader.cross_layer_graph().await?;
    let lookup = dependency_lookup(&graph, &pair, query)
        .ok_or_else(|| ApiError::not_found(format!("layer pair {pair}")))?;
    Ok(Json(lookup).into_response())
}

/// GET /api/svd - SAE versus SVD baseline, one row per layer
pub async fn api_svd(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let comparison = state.loader.svd_comparison().await?;
    Ok(Json(json!({
        "aggregate": comparison.aggregate,
        "layers": svd_rows(&comparison),
    }))
    .into_response())
}

/// GET /api/tracking - Feature persistence tracking, passed through
pub async fn api_tracking(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let tracking = state.loader.cross_layer_tracking().await?;
    Ok(Json(&*tracking).into_response())
}

/// GET /api/novel/{layer} - Novel feature clusters of a layer
pub async fn api_novel(
    State(state): State<SharedState>,
    Path(layer): Path<u32>,
) -> Result<Response, ApiError> {
    state.loader.check_layer(layer)?;
    let clusters = state.loader.novel_clusters().await?;
    let entry = clusters
        .for_layer(layer)
        .ok_or_else(|| ApiError::not_found(format!("novel clusters for layer {layer}")))?;
    Ok(Json(entry).into_response())
}
