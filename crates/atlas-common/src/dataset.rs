//! Dataset keys for the static artifact routes.
//!
//! Every artifact the explorer reads is named by a [`Dataset`] variant. The
//! variant renders to a [`DatasetKey`], the relative path under the data base
//! path. Keys are deterministic: the same variant always yields the same key,
//! with layer numbers zero-padded to two digits (`layer_03_features.json`).

use std::fmt;

use serde::Serialize;

/// Upper bound on layer numbers that fit the two-digit key format.
pub const MAX_LAYERS: u32 = 100;

/// Opaque identifier of one JSON artifact, relative to the data base path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DatasetKey(String);

impl DatasetKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatasetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The closed set of artifact routes served by the static backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "dataset", content = "layer", rename_all = "snake_case")]
pub enum Dataset {
    /// Aggregate counts, one entry per layer
    GlobalSummary,
    /// Compact feature table of one layer
    LayerFeatures(u32),
    /// 2D projection coordinates of one layer
    LayerPositions(u32),
    /// Full annotation detail of one layer
    LayerAnnotations(u32),
    /// Cell-type / tissue enrichment of one layer (may be absent)
    LayerCellTypes(u32),
    /// Co-activation modules across all layers
    Modules,
    /// Cross-layer dependencies keyed by layer pair
    CrossLayerGraph,
    /// Causal patching results for the designated layer
    CausalPatching,
    /// Perturbation response results for the designated layer
    PerturbationResponse,
    /// SVD baseline vs SAE comparison
    SvdComparison,
    /// Cross-layer persistence tracking
    CrossLayerTracking,
    /// Novel (unannotated) feature clusters
    NovelClusters,
    /// Gene name → features index
    GeneIndex,
    /// Ontology term → features index
    OntologyIndex,
}

const LAYER_SUFFIXES: [(&str, fn(u32) -> Dataset); 4] = [
    ("features.json", Dataset::LayerFeatures),
    ("positions.json", Dataset::LayerPositions),
    ("annotations.json", Dataset::LayerAnnotations),
    ("celltypes.json", Dataset::LayerCellTypes),
];

impl Dataset {
    /// Datasets that are not parameterised by layer.
    pub const GLOBAL: [Dataset; 10] = [
        Dataset::GlobalSummary,
        Dataset::Modules,
        Dataset::CrossLayerGraph,
        Dataset::CausalPatching,
        Dataset::PerturbationResponse,
        Dataset::SvdComparison,
        Dataset::CrossLayerTracking,
        Dataset::NovelClusters,
        Dataset::GeneIndex,
        Dataset::OntologyIndex,
    ];

    /// Render the relative route for this dataset.
    pub fn key(&self) -> DatasetKey {
        let path = match self {
            Dataset::GlobalSummary => "global_summary.json".to_string(),
            Dataset::LayerFeatures(l) => format!("layer_{l:02}_features.json"),
            Dataset::LayerPositions(l) => format!("layer_{l:02}_positions.json"),
            Dataset::LayerAnnotations(l) => format!("layer_{l:02}_annotations.json"),
            Dataset::LayerCellTypes(l) => format!("layer_{l:02}_celltypes.json"),
            Dataset::Modules => "modules.json".to_string(),
            Dataset::CrossLayerGraph => "cross_layer_graph.json".to_string(),
            Dataset::CausalPatching => "causal_patching.json".to_string(),
            Dataset::PerturbationResponse => "perturbation_response.json".to_string(),
            Dataset::SvdComparison => "svd_comparison.json".to_string(),
            Dataset::CrossLayerTracking => "cross_layer_tracking.json".to_string(),
            Dataset::NovelClusters => "novel_clusters.json".to_string(),
            Dataset::GeneIndex => "gene_index.json".to_string(),
            Dataset::OntologyIndex => "ontology_index.json".to_string(),
        };
        DatasetKey(path)
    }

    /// Layer parameter, for per-layer datasets.
    pub fn layer(&self) -> Option<u32> {
        match *self {
            Dataset::LayerFeatures(l)
            | Dataset::LayerPositions(l)
            | Dataset::LayerAnnotations(l)
            | Dataset::LayerCellTypes(l) => Some(l),
            _ => None,
        }
    }

    /// Whether absence of this artifact is an expected outcome.
    pub fn is_optional(&self) -> bool {
        matches!(self, Dataset::LayerCellTypes(_))
    }

    /// Parse a key back into its dataset, if it names a known route.
    pub fn from_key(key: &str) -> Option<Dataset> {
        if let Some(rest) = key.strip_prefix("layer_") {
            let (digits, suffix) = rest.split_once('_')?;
            if digits.len() != 2 {
                return None;
            }
            let layer: u32 = digits.parse().ok()?;
            return LAYER_SUFFIXES
                .iter()
                .find(|(s, _)| *s == suffix)
                .map(|(_, ctor)| ctor(layer));
        }
        Dataset::GLOBAL.iter().copied().find(|d| d.key().as_str() == key)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_keys_are_zero_padded() {
        assert_eq!(Dataset::LayerFeatures(3).key().as_str(), "layer_03_features.json");
        assert_eq!(Dataset::LayerPositions(11).key().as_str(), "layer_11_positions.json");
        assert_eq!(Dataset::LayerCellTypes(0).key().as_str(), "layer_00_celltypes.json");
    }

    #[test]
    fn test_same_request_same_key() {
        assert_eq!(Dataset::LayerAnnotations(7).key(), Dataset::LayerAnnotations(7).key());
        assert_ne!(Dataset::LayerAnnotations(7).key(), Dataset::LayerFeatures(7).key());
    }

    #[test]
    fn test_from_key_round_trips_known_routes() {
        assert_eq!(Dataset::from_key("global_summary.json"), Some(Dataset::GlobalSummary));
        assert_eq!(Dataset::from_key("layer_05_features.json"), Some(Dataset::LayerFeatures(5)));
        assert_eq!(Dataset::from_key("layer_17_celltypes.json"), Some(Dataset::LayerCellTypes(17)));
        assert_eq!(Dataset::from_key("gene_index.json"), Some(Dataset::GeneIndex));
    }

    #[test]
    fn test_from_key_rejects_unknown_routes() {
        assert_eq!(Dataset::from_key("layer_5_features.json"), None);
        assert_eq!(Dataset::from_key("layer_05_weights.json"), None);
        assert_eq!(Dataset::from_key("../etc/passwd"), None);
    }

    #[test]
    fn test_only_celltypes_is_optional() {
        assert!(Dataset::LayerCellTypes(2).is_optional());
        assert!(!Dataset::LayerFeatures(2).is_optional());
        assert!(Dataset::GLOBAL.iter().all(|d| !d.is_optional()));
    }
}
