//! Layer overview: the per-layer table and ontology bars on the landing page.

use serde::Serialize;

use atlas_common::artifacts::GlobalSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub features: u64,
    pub alive: u64,
    pub annotated: u64,
    pub modules: u64,
    pub novel: u64,
    pub n_layers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerRow {
    pub layer: u32,
    pub alive: u32,
    pub dead: u32,
    pub annotated: u32,
    /// Percent of alive features with at least one annotation
    pub annotation_pct: f64,
    pub n_modules: u32,
    pub n_svd_aligned: u32,
    pub n_novel: u32,
    pub variance_explained: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OntologyBar {
    pub layer: u32,
    pub ontology: &'static str,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerOverview {
    pub totals: Totals,
    pub layers: Vec<LayerRow>,
    pub ontology_bars: Vec<OntologyBar>,
}

pub fn layer_overview(summary: &GlobalSummary) -> LayerOverview {
    let mut layers: Vec<_> = summary.layers.iter().collect();
    layers.sort_by_key(|l| l.layer);

    let rows = layers
        .iter()
        .map(|l| LayerRow {
            layer: l.layer,
            alive: l.alive,
            dead: l.dead,
            annotated: l.annotated,
            annotation_pct: (l.annotation_rate * 1000.0).round() / 10.0,
            n_modules: l.n_modules,
            n_svd_aligned: l.n_svd_aligned,
            n_novel: l.n_novel,
            variance_explained: l.variance_explained,
        })
        .collect();

    let ontology_bars = layers
        .iter()
        .flat_map(|l| {
            l.ontology_counts
                .entries()
                .into_iter()
                .map(move |(ontology, count)| OntologyBar { layer: l.layer, ontology, count })
        })
        .collect();

    LayerOverview {
        totals: Totals {
            features: summary.total_features,
            alive: summary.total_alive,
            annotated: summary.total_annotated,
            modules: summary.total_modules,
            novel: summary.total_novel,
            n_layers: summary.n_layers,
        },
        layers: rows,
        ontology_bars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_test_utils::fixtures;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overview_from_sample_summary() {
        let summary: GlobalSummary = serde_json::from_value(fixtures::global_summary()).unwrap();
        let overview = layer_overview(&summary);

        assert_eq!(overview.totals.features, 82525);
        assert_eq!(overview.layers.len(), 2);
        assert_eq!(overview.layers[0].annotation_pct, 12.0);
        assert_eq!(overview.layers[1].variance_explained, None);
        assert_eq!(overview.ontology_bars.len(), 10);
        assert_eq!(
            overview.ontology_bars[1],
            OntologyBar { layer: 0, ontology: "KEGG", count: 120 }
        );
    }

    #[test]
    fn test_rows_ordered_by_layer() {
        let summary: GlobalSummary = serde_json::from_value(serde_json::json!({
            "layers": [{"layer": 4}, {"layer": 1}, {"layer": 2}]
        }))
        .unwrap();
        let layers: Vec<u32> = layer_overview(&summary).layers.iter().map(|r| r.layer).collect();
        assert_eq!(layers, vec![1, 2, 4]);
    }
}
