//! Small artifact documents shaped like the preprocessed atlas output.
//!
//! The sample atlas has [`SAMPLE_LAYERS`] layers with six features each.
//! Layer 0 carries a cell-type document; layer 1 does not.

use serde_json::{json, Value};

use atlas_common::artifacts::{FeatureRecord, GeneActivation};
use atlas_common::Dataset;

use crate::ScriptedSource;

pub const SAMPLE_LAYERS: u32 = 2;
pub const SAMPLE_TOTAL_FEATURES: u64 = 82525;

/// Build a feature record with the given top genes; everything else defaults.
pub fn feature(id: u32, n_annotations: u32, genes: &[&str]) -> FeatureRecord {
    FeatureRecord {
        id,
        n_annotations,
        top_genes: genes
            .iter()
            .enumerate()
            .map(|(rank, name)| GeneActivation {
                name: name.to_string(),
                activation: 1.0 - rank as f64 * 0.1,
                fire_count: None,
            })
            .collect(),
        ..FeatureRecord::default()
    }
}

pub fn global_summary() -> Value {
    json!({
        "total_features": SAMPLE_TOTAL_FEATURES,
        "total_alive": 80112,
        "total_annotated": 29000,
        "total_modules": 4,
        "total_novel": 3,
        "n_layers": SAMPLE_LAYERS,
        "n_features_per_layer": 4608,
        "layers": [
            {
                "layer": 0, "alive": 4500, "dead": 108, "annotated": 540, "annotation_rate": 0.12,
                "n_modules": 2, "n_svd_aligned": 60, "n_novel": 2,
                "ontology_counts": {"GO_BP": 300, "KEGG": 120, "Reactome": 80, "STRING": 30, "TRRUST": 10},
                "mean_feature_cosine": 0.04, "variance_explained": 0.81
            },
            {
                "layer": 1, "alive": 4400, "dead": 208, "annotated": 880, "annotation_rate": 0.2,
                "n_modules": 2, "n_svd_aligned": 75, "n_novel": 1,
                "ontology_counts": {"GO_BP": 500, "KEGG": 200, "Reactome": 120, "STRING": 40, "TRRUST": 20},
                "mean_feature_cosine": 0.05
            }
        ]
    })
}

/// Feature records for one layer.
///
/// Gene names are chosen so that a `TP53` filter hits exact, longer and
/// lower-case spellings, and annotation counts tie in pairs.
pub fn layer_features(layer: u32) -> Value {
    json!([
        {"i": 0, "d": true, "f": 0.0, "ma": 0.0, "fc": 0, "na": 0, "m": -1, "sv": false,
         "lb": "", "to": "none", "tg": []},
        {"i": 1, "d": false, "f": 0.021, "ma": 1.9, "fc": 210, "na": 3, "m": 0, "sv": true,
         "lb": "p53 signaling", "to": "KEGG",
         "tg": [{"n": "TP53", "a": 0.93}, {"n": "MDM2", "a": 0.71}]},
        {"i": 2, "d": false, "f": 0.015, "ma": 1.2, "fc": 150, "na": 5, "m": 0, "sv": false,
         "lb": "DNA repair", "to": "GO_BP",
         "tg": [{"n": "TP53BP1", "a": 0.88}, {"n": "BRCA1", "a": 0.6}]},
        {"i": 3, "d": false, "f": 0.004, "ma": 0.8, "fc": 40, "na": 3, "m": 1, "sv": false,
         "lb": "Apoptosis", "to": "Reactome",
         "tg": [{"n": "tp53", "a": 0.5}, {"n": "BAX", "a": 0.45}]},
        {"i": 4, "d": false, "f": 0.032, "ma": 2.4, "fc": 320, "na": 0, "m": 1, "sv": true,
         "lb": "", "to": "none",
         "tg": [{"n": "GATA1", "a": 0.99}, {"n": "HBB", "a": 0.97}]},
        {"i": 5, "d": false, "f": 0.011, "ma": 1.1, "fc": 110, "na": 5, "m": 1, "sv": false,
         "lb": format!("Heme biosynthesis L{layer}"), "to": "KEGG",
         "tg": [{"n": "HBG1", "a": 0.9}, {"n": "ALAS2", "a": 0.8}]}
    ])
}

pub fn layer_positions() -> Value {
    json!([[0.0, 0.0], [1.0, 0.5], [1.5, -0.5], [-1.0, 2.0], [3.0, 3.0], [2.5, -1.0]])
}

pub fn layer_annotations() -> Value {
    json!({
        "1": {
            "genes": [{"n": "TP53", "a": 0.93, "fc": 180}, {"n": "MDM2", "a": 0.71, "fc": 90}],
            "anns": [
                {"o": "GO_BP", "t": "Cell cycle arrest", "p": 0.003, "or": 3.1, "n": 2, "g": ["TP53", "MDM2"]},
                {"o": "KEGG", "t": "p53 signaling", "p": 1e-8, "or": 12.0, "n": 2, "g": ["TP53", "MDM2"]},
                {"o": "TRRUST", "t": "TP53 targets", "p": 0.0004, "or": 5.5, "n": 1, "g": ["MDM2"]}
            ]
        },
        "2": {
            "genes": [{"n": "TP53BP1", "a": 0.88, "fc": 120}],
            "anns": [{"o": "GO_BP", "t": "DNA repair", "p": 1e-5, "or": 8.0, "n": 2, "g": ["TP53BP1", "BRCA1"]}]
        },
        "5": {
            "genes": [{"n": "HBG1", "a": 0.9, "fc": 100}],
            "anns": [{"o": "KEGG", "t": "Heme biosynthesis", "p": 0.002, "or": 6.0, "n": 2, "g": ["HBG1", "ALAS2"]}]
        }
    })
}

pub fn layer_cell_types() -> Value {
    json!({
        "summary": {"n_cells": 2000, "tissues": ["blood", "liver"], "n_cell_types": 2, "n_features_with_enrichment": 1},
        "cell_type_meta": {
            "erythroblast": {"n": 400, "t": "blood"},
            "hepatocyte": {"n": 900, "t": "liver"}
        },
        "features": {
            "4": {
                "ct": [{"c": "erythroblast", "p": 1e-6, "or": 9.0, "n": 30}],
                "ti": [{"t": "blood", "p": 1e-4, "or": 4.0}],
                "tc": [{"ct": "erythroblast", "t": "blood", "a": 3.2}]
            }
        }
    })
}

pub fn modules() -> Value {
    json!([
        {"layer": 0, "id": 0, "n": 2, "features": [1, 2],
         "top_anns": [{"t": "DNA repair", "c": 1}, {"t": "p53 signaling", "c": 1}]},
        {"layer": 0, "id": 1, "n": 3, "features": [3, 4, 5],
         "top_anns": [{"t": "Heme biosynthesis", "c": 1}]},
        {"layer": 1, "id": 0, "n": 2, "features": [1, 2], "top_anns": []},
        {"layer": 1, "id": 1, "n": 3, "features": [3, 4, 5], "top_anns": []}
    ])
}

pub fn cross_layer_graph() -> Value {
    json!({
        "L00_L01": {
            "summary": {"n_pairs": 3},
            "deps": [
                {"a": 1, "deps": [{"b": 2, "pmi": 2.5, "lb": "DNA repair"}, {"b": 3, "pmi": 1.1, "lb": "Apoptosis"}]},
                {"a": 4, "deps": [{"b": 5, "pmi": 3.0, "lb": "Heme biosynthesis L1"}]}
            ]
        }
    })
}

pub fn causal_patching() -> Value {
    json!({
        "summary": {"n_features": 3, "layer": 1},
        "features": [
            {"i": 1, "lb": "p53 signaling", "na": 3, "af": 0.021, "tg": ["TP53", "MDM2"],
             "td": -0.8, "od": -0.1, "sr": 8.0},
            {"i": 2, "lb": "DNA repair", "na": 5, "af": 0.015, "tg": [{"n": "TP53BP1"}],
             "td": -0.3, "od": -0.2, "sr": 1.5},
            {"i": 5, "lb": "Heme biosynthesis L1", "na": 5, "af": 0.011, "tg": ["HBG1"],
             "td": -1.2, "od": -0.4, "sr": 3.0}
        ]
    })
}

pub fn perturbation_response() -> Value {
    json!({
        "summary": {"n_targets": 3},
        "targets": [
            {"gene": "TP53", "tf": true, "nk": 120, "nr": 14, "ns": 6,
             "top": [{"i": 1, "es": 1.8, "lb": "p53 signaling"}]},
            {"gene": "GATA1", "tf": true, "nk": 60, "nr": 20, "ns": 9,
             "top": [{"i": 4, "es": 2.2, "lb": ""}]},
            {"gene": "HBB", "tf": false, "nk": 0, "nr": 5, "ns": 2, "top": []}
        ]
    })
}

pub fn svd_comparison() -> Value {
    json!({
        "aggregate": {"mean_gain": 0.12},
        "per_layer": {
            "1": {"svd_variance": 0.6, "sae_variance": 0.75, "gain": 0.15, "n_aligned": 75, "n_novel": 1},
            "0": {"svd_variance": 0.7, "sae_variance": 0.81, "gain": 0.11, "n_aligned": 60, "n_novel": 2}
        }
    })
}

pub fn cross_layer_tracking() -> Value {
    json!({"chains": [{"start": {"l": 0, "i": 1}, "path": [{"l": 1, "i": 2}]}]})
}

pub fn novel_clusters() -> Value {
    json!({
        "0": {"summary": {"n_clusters": 2}, "clusters": [{"id": 0, "features": [4]}, {"id": 1, "features": [0]}]},
        "1": {"summary": {"n_clusters": 1}, "clusters": [{"id": 0, "features": [4]}]}
    })
}

pub fn gene_index() -> Value {
    json!({
        "TP53": [{"l": 0, "i": 1, "r": 0, "lb": "p53 signaling", "m": 0},
                 {"l": 1, "i": 1, "r": 0, "lb": "p53 signaling", "m": 0}],
        "TP53BP1": [{"l": 0, "i": 2, "r": 0, "lb": "DNA repair", "m": 0}],
        "MDM2": [{"l": 0, "i": 1, "r": 1, "lb": "p53 signaling", "m": 0}],
        "ATP5F1": [{"l": 1, "i": 3, "r": 4, "lb": "", "m": -1}],
        "GATA1": [{"l": 0, "i": 4, "r": 0, "lb": "", "m": 1}],
        "HBG1": [{"l": 0, "i": 5, "r": 0, "lb": "Heme biosynthesis L0", "m": 1}]
    })
}

pub fn ontology_index() -> Value {
    json!({
        "DNA repair": [{"l": 0, "i": 2, "p": 1e-5, "o": "GO_BP"}, {"l": 1, "i": 2, "p": 1e-3, "o": "GO_BP"}],
        "p53 signaling": [{"l": 0, "i": 1, "p": 1e-8, "o": "KEGG"}],
        "Mismatch repair": [{"l": 1, "i": 3, "p": 0.01, "o": "KEGG"}],
        "Heme biosynthesis": [{"l": 0, "i": 5, "p": 0.002, "o": "KEGG"}]
    })
}

/// Every document of the sample atlas.
pub fn sample_documents() -> Vec<(Dataset, Value)> {
    let mut docs = vec![
        (Dataset::GlobalSummary, global_summary()),
        (Dataset::Modules, modules()),
        (Dataset::CrossLayerGraph, cross_layer_graph()),
        (Dataset::CausalPatching, causal_patching()),
        (Dataset::PerturbationResponse, perturbation_response()),
        (Dataset::SvdComparison, svd_comparison()),
        (Dataset::CrossLayerTracking, cross_layer_tracking()),
        (Dataset::NovelClusters, novel_clusters()),
        (Dataset::GeneIndex, gene_index()),
        (Dataset::OntologyIndex, ontology_index()),
    ];
    for layer in 0..SAMPLE_LAYERS {
        docs.push((Dataset::LayerFeatures(layer), layer_features(layer)));
        docs.push((Dataset::LayerPositions(layer), layer_positions()));
        docs.push((Dataset::LayerAnnotations(layer), layer_annotations()));
    }
    docs.push((Dataset::LayerCellTypes(0), layer_cell_types()));
    docs
}

/// A scripted source serving the whole sample atlas.
pub fn sample_source() -> ScriptedSource {
    sample_documents()
        .into_iter()
        .fold(ScriptedSource::new(), |source, (dataset, body)| source.with_json(dataset, body))
}
