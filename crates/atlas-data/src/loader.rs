//! The "load dataset X" entry point used by every view.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use atlas_common::artifacts::{
    CausalPatching, CellTypeEnrichment, CrossLayerGraph, CrossLayerTracking, FeatureRecord,
    GeneIndex, GlobalSummary, LayerAnnotations, LayerPositions, Module, NovelClusters,
    OntologyIndex, PerturbationResponse, SvdComparison,
};
use atlas_common::config::{DataConfig, SourceKind};
use atlas_common::{AtlasError, Dataset, FetchFailure, Result};

use crate::cache::{CacheStats, DatasetCache};
use crate::source::{DatasetSource, HttpSource, LocalDirSource};

/// Layer the causal patching and perturbation artifacts were computed on.
pub const DEFAULT_CAUSAL_LAYER: u32 = 11;

/// Memoizing loader over a [`DatasetSource`].
///
/// Create one per process and share it behind an `Arc`; the cache lives as
/// long as the loader and is never cleared.
pub struct DataLoader {
    source: Arc<dyn DatasetSource>,
    cache: DatasetCache,
    n_layers: u32,
    causal_layer: u32,
}

impl std::fmt::Debug for DataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("source", &self.source.describe())
            .field("n_layers", &self.n_layers)
            .field("causal_layer", &self.causal_layer)
            .finish()
    }
}

impl DataLoader {
    pub fn new(source: Arc<dyn DatasetSource>, n_layers: u32) -> Self {
        Self {
            source,
            cache: DatasetCache::new(),
            n_layers,
            causal_layer: n_layers.saturating_sub(1).min(DEFAULT_CAUSAL_LAYER),
        }
    }

    pub fn with_causal_layer(mut self, layer: u32) -> Self {
        self.causal_layer = layer;
        self
    }

    /// Build the loader described by the `[data]` config section.
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        let source: Arc<dyn DatasetSource> = match config.source {
            SourceKind::Http => {
                let client = reqwest::Client::builder()
                    .user_agent(config.user_agent.as_str())
                    .build()
                    .map_err(|e| AtlasError::Other(e.into()))?;
                Arc::new(HttpSource::with_client(client, &config.base_url)?)
            }
            SourceKind::Local => Arc::new(LocalDirSource::new(&config.local_dir)),
        };
        info!(source = %source.describe(), n_layers = config.n_layers, "Data loader ready");
        Ok(Self::new(source, config.n_layers).with_causal_layer(config.causal_layer))
    }

    pub fn n_layers(&self) -> u32 {
        self.n_layers
    }

    pub fn causal_layer(&self) -> u32 {
        self.causal_layer
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub fn check_layer(&self, layer: u32) -> Result<()> {
        if layer >= self.n_layers {
            return Err(AtlasError::InvalidLayer { layer, n_layers: self.n_layers });
        }
        Ok(())
    }

    /// Load and decode `dataset`, serving repeat requests from the cache.
    ///
    /// The decoded type is fixed by the first successful load of a key; asking
    /// for the same key as a different type fails with `TypeMismatch`.
    #[instrument(skip(self), fields(key = %dataset))]
    pub async fn fetch_dataset<T>(&self, dataset: Dataset) -> Result<Arc<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        if let Some(layer) = dataset.layer() {
            self.check_layer(layer)?;
        }

        let key = dataset.key();
        let source = Arc::clone(&self.source);
        let result = self
            .cache
            .get_or_load(&key, || async move {
                let key = dataset.key();
                info!("Fetching {}", key);
                let body = source.fetch(&key).await?;
                serde_json::from_slice::<T>(&body).map_err(|e| FetchFailure::decode(key, e.to_string()))
            })
            .await;

        if let Err(ref e) = result {
            if !dataset.is_optional() {
                warn!(error = %e, "Dataset load failed");
            }
        }
        result
    }

    // ── Typed endpoints ──────────────────────────────────────────────────────

    pub async fn global_summary(&self) -> Result<Arc<GlobalSummary>> {
        self.fetch_dataset(Dataset::GlobalSummary).await
    }

    pub async fn layer_features(&self, layer: u32) -> Result<Arc<Vec<FeatureRecord>>> {
        self.fetch_dataset(Dataset::LayerFeatures(layer)).await
    }

    pub async fn layer_positions(&self, layer: u32) -> Result<Arc<LayerPositions>> {
        self.fetch_dataset(Dataset::LayerPositions(layer)).await
    }

    pub async fn layer_annotations(&self, layer: u32) -> Result<Arc<LayerAnnotations>> {
        self.fetch_dataset(Dataset::LayerAnnotations(layer)).await
    }

    /// Cell-type enrichment of a layer. Not every layer has one, so any fetch
    /// or decode failure resolves to `None` rather than an error.
    pub async fn layer_cell_types(&self, layer: u32) -> Result<Option<Arc<CellTypeEnrichment>>> {
        match self.fetch_dataset(Dataset::LayerCellTypes(layer)).await {
            Ok(enrichment) => Ok(Some(enrichment)),
            Err(AtlasError::Fetch(failure)) => {
                debug!(key = %failure.key, reason = %failure.reason, "No cell-type enrichment");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Features and positions of a layer, fetched concurrently.
    pub async fn layer_scatter_inputs(
        &self,
        layer: u32,
    ) -> Result<(Arc<Vec<FeatureRecord>>, Arc<LayerPositions>)> {
        tokio::try_join!(self.layer_features(layer), self.layer_positions(layer))
    }

    pub async fn modules(&self) -> Result<Arc<Vec<Module>>> {
        self.fetch_dataset(Dataset::Modules).await
    }

    pub async fn cross_layer_graph(&self) -> Result<Arc<CrossLayerGraph>> {
        self.fetch_dataset(Dataset::CrossLayerGraph).await
    }

    pub async fn causal_patching(&self) -> Result<Arc<CausalPatching>> {
        self.fetch_dataset(Dataset::CausalPatching).await
    }

    pub async fn perturbation_response(&self) -> Result<Arc<PerturbationResponse>> {
        self.fetch_dataset(Dataset::PerturbationResponse).await
    }

    pub async fn svd_comparison(&self) -> Result<Arc<SvdComparison>> {
        self.fetch_dataset(Dataset::SvdComparison).await
    }

    pub async fn cross_layer_tracking(&self) -> Result<Arc<CrossLayerTracking>> {
        self.fetch_dataset(Dataset::CrossLayerTracking).await
    }

    pub async fn novel_clusters(&self) -> Result<Arc<NovelClusters>> {
        self.fetch_dataset(Dataset::NovelClusters).await
    }

    pub async fn gene_index(&self) -> Result<Arc<GeneIndex>> {
        self.fetch_dataset(Dataset::GeneIndex).await
    }

    pub async fn ontology_index(&self) -> Result<Arc<OntologyIndex>> {
        self.fetch_dataset(Dataset::OntologyIndex).await
    }

    // ── Warm-up and introspection ────────────────────────────────────────────

    /// Load `dataset` with its proper type, discarding the value.
    async fn warm(&self, dataset: Dataset) -> Result<()> {
        match dataset {
            Dataset::GlobalSummary => self.global_summary().await.map(drop),
            Dataset::LayerFeatures(l) => self.layer_features(l).await.map(drop),
            Dataset::LayerPositions(l) => self.layer_positions(l).await.map(drop),
            Dataset::LayerAnnotations(l) => self.layer_annotations(l).await.map(drop),
            Dataset::LayerCellTypes(l) => self.layer_cell_types(l).await.map(drop),
            Dataset::Modules => self.modules().await.map(drop),
            Dataset::CrossLayerGraph => self.cross_layer_graph().await.map(drop),
            Dataset::CausalPatching => self.causal_patching().await.map(drop),
            Dataset::PerturbationResponse => self.perturbation_response().await.map(drop),
            Dataset::SvdComparison => self.svd_comparison().await.map(drop),
            Dataset::CrossLayerTracking => self.cross_layer_tracking().await.map(drop),
            Dataset::NovelClusters => self.novel_clusters().await.map(drop),
            Dataset::GeneIndex => self.gene_index().await.map(drop),
            Dataset::OntologyIndex => self.ontology_index().await.map(drop),
        }
    }

    /// Load several datasets concurrently. Failures are reported per dataset;
    /// one failing never stops the others.
    pub async fn prefetch(&self, datasets: &[Dataset]) -> Vec<(Dataset, Result<()>)> {
        let results = join_all(datasets.iter().map(|d| self.warm(*d))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(requested = datasets.len(), failed, "Prefetch complete");
        datasets.iter().copied().zip(results).collect()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
