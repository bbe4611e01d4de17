//! End-to-end behaviour of the data layer against scripted and HTTP sources.

use std::sync::Arc;
use std::time::Duration;

use atlas_common::artifacts::FeatureRecord;
use atlas_common::{AtlasError, Dataset};
use atlas_data::{DataLoader, HttpSource, Subscription};
use atlas_test_utils::fixtures::{self, SAMPLE_LAYERS, SAMPLE_TOTAL_FEATURES};
use atlas_test_utils::server::TestServer;
use atlas_test_utils::ScriptedSource;
use pretty_assertions::assert_eq;

fn loader_over(source: &Arc<ScriptedSource>) -> Arc<DataLoader> {
    Arc::new(DataLoader::new(source.clone(), SAMPLE_LAYERS))
}

async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn label_of(features: &[FeatureRecord], id: u32) -> &str {
    features
        .iter()
        .find(|f| f.id == id)
        .map(|f| f.label.as_str())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_repeat_fetch_is_served_from_cache() {
    let source = Arc::new(fixtures::sample_source());
    let loader = loader_over(&source);

    let first = loader.layer_features(0).await.unwrap();
    let second = loader.layer_features(0).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.calls(Dataset::LayerFeatures(0)), 1);
}

#[tokio::test]
async fn test_concurrent_first_requests_share_one_fetch() {
    let source = Arc::new(fixtures::sample_source());
    let gate = source.hold(Dataset::Modules);
    let loader = loader_over(&source);

    let (a, b) = {
        let a = tokio::spawn({
            let loader = loader.clone();
            async move { loader.modules().await }
        });
        let b = tokio::spawn({
            let loader = loader.clone();
            async move { loader.modules().await }
        });
        settle_tasks().await;
        gate.release();
        (a.await.unwrap().unwrap(), b.await.unwrap().unwrap())
    };

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(source.calls(Dataset::Modules), 1);
}

#[tokio::test]
async fn test_switching_layers_discards_the_older_result() {
    let source = Arc::new(
        fixtures::sample_source()
            .with_json(Dataset::LayerFeatures(3), fixtures::layer_features(3))
            .with_json(Dataset::LayerFeatures(5), fixtures::layer_features(5)),
    );
    let slow_layer = source.hold(Dataset::LayerFeatures(3));
    let loader = Arc::new(DataLoader::new(source.clone(), 6));

    let view: Subscription<Vec<FeatureRecord>, u32> = Subscription::new();
    for layer in [3, 5] {
        let l = loader.clone();
        view.use_dataset(layer, move || async move { l.layer_features(layer).await });
    }

    let state = view.settled().await;
    assert_eq!(label_of(state.data.as_deref().unwrap(), 5), "Heme biosynthesis L5");

    // Let the layer 3 load finish; it must not overwrite the layer 5 state
    slow_layer.release();
    loader.layer_features(3).await.unwrap();
    settle_tasks().await;

    let state = view.state();
    assert!(!state.loading);
    assert_eq!(label_of(state.data.as_deref().unwrap(), 5), "Heme biosynthesis L5");
    assert_eq!(view.dependency(), Some(5));
}

#[tokio::test]
async fn test_teardown_before_completion_sends_nothing() {
    let source = Arc::new(fixtures::sample_source());
    let gate = source.hold(Dataset::GeneIndex);
    let loader = loader_over(&source);

    let view = Subscription::new();
    let l = loader.clone();
    view.use_dataset((), move || async move { l.gene_index().await });
    let mut updates = view.watch();
    let _ = updates.borrow_and_update();

    view.teardown();
    gate.release();
    loader.gene_index().await.unwrap();
    settle_tasks().await;

    assert!(!updates.has_changed().unwrap_or(false));
    assert!(updates.borrow().loading);
    // The abandoned fetch still populated the cache
    assert!(loader.cache().contains(&Dataset::GeneIndex.key()).await);
    assert_eq!(source.calls(Dataset::GeneIndex), 1);
}

#[tokio::test]
async fn test_failed_dataset_does_not_affect_others() {
    let source = Arc::new(fixtures::sample_source().with_status(Dataset::Modules, 500));
    let loader = loader_over(&source);

    let modules_view = Subscription::new();
    let genes_view = Subscription::new();
    let l = loader.clone();
    modules_view.use_dataset((), move || async move { l.modules().await });
    let l = loader.clone();
    genes_view.use_dataset((), move || async move { l.gene_index().await });

    let modules = modules_view.settled().await;
    let genes = genes_view.settled().await;

    assert!(modules.data.is_none());
    assert_eq!(modules.error.as_deref(), Some("Failed to load modules.json: HTTP 500"));
    assert!(genes.error.is_none());
    assert!(genes.data.unwrap().0.contains_key("TP53"));
}

#[tokio::test]
async fn test_failure_is_retried_on_next_request() {
    let source = Arc::new(fixtures::sample_source().with_status(Dataset::Modules, 503));
    let loader = loader_over(&source);

    let err = loader.modules().await.unwrap_err();
    assert!(matches!(err, AtlasError::Fetch(ref f) if f.status_code() == Some(503)));

    source.set_json(Dataset::Modules, fixtures::modules());
    let modules = loader.modules().await.unwrap();
    assert_eq!(modules.len(), 4);
    assert_eq!(source.calls(Dataset::Modules), 2);
}

#[tokio::test]
async fn test_missing_cell_types_settle_as_absent() {
    let source = Arc::new(fixtures::sample_source());
    let loader = loader_over(&source);

    let view = Subscription::new();
    let l = loader.clone();
    view.use_optional_dataset(1u32, move || async move { l.layer_cell_types(1).await });
    let state = view.settled().await;

    assert!(!state.loading);
    assert!(state.data.is_none());
    assert!(state.error.is_none());

    let present = loader.layer_cell_types(0).await.unwrap();
    assert!(present.unwrap().for_feature(4).is_some());
}

#[tokio::test]
async fn test_invalid_layer_never_reaches_the_source() {
    let source = Arc::new(fixtures::sample_source());
    let loader = loader_over(&source);

    let err = loader.layer_positions(SAMPLE_LAYERS).await.unwrap_err();
    assert!(matches!(err, AtlasError::InvalidLayer { layer: 2, n_layers: 2 }));
    assert_eq!(source.total_calls(), 0);
}

#[tokio::test]
async fn test_global_summary_issues_one_http_request() {
    let server = TestServer::start(fixtures::sample_documents()).await.unwrap();
    let source = HttpSource::new(&server.data_url()).unwrap();
    let loader = Arc::new(DataLoader::new(Arc::new(source), SAMPLE_LAYERS));

    let header = {
        let l = loader.clone();
        tokio::spawn(async move { l.global_summary().await })
    };
    let overview = {
        let l = loader.clone();
        tokio::spawn(async move { l.global_summary().await })
    };
    let header = header.await.unwrap().unwrap();
    let overview = overview.await.unwrap().unwrap();

    assert_eq!(header.total_features, SAMPLE_TOTAL_FEATURES);
    assert_eq!(overview.total_features, SAMPLE_TOTAL_FEATURES);
    assert_eq!(server.hits("/data/global_summary.json"), 1);
}

#[tokio::test]
async fn test_http_404_for_optional_resource_is_absent() {
    let server = TestServer::start(fixtures::sample_documents()).await.unwrap();
    let source = HttpSource::new(&server.data_url()).unwrap();
    let loader = DataLoader::new(Arc::new(source), SAMPLE_LAYERS);

    assert!(loader.layer_cell_types(1).await.unwrap().is_none());
    assert!(loader.layer_cell_types(0).await.unwrap().is_some());

    assert!(loader.svd_comparison().await.is_ok());
    assert_eq!(server.requests().len(), 3);
}

#[tokio::test]
async fn test_prefetch_reports_each_dataset() {
    let source = Arc::new(fixtures::sample_source().with_status(Dataset::NovelClusters, 404));
    let loader = loader_over(&source);

    let results = tokio::time::timeout(
        Duration::from_secs(5),
        loader.prefetch(&[Dataset::GlobalSummary, Dataset::NovelClusters, Dataset::LayerFeatures(1)]),
    )
    .await
    .unwrap();

    let failed: Vec<_> = results
        .iter()
        .filter(|(_, r)| r.is_err())
        .map(|(d, _)| *d)
        .collect();
    assert_eq!(failed, vec![Dataset::NovelClusters]);
    assert_eq!(loader.cache_stats().await.resolved, 2);
}
