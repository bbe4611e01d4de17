//! Typed shapes of the JSON artifacts served to the explorer.
//!
//! The artifacts are written with compact field names (`i`, `lb`, `tg`, ...)
//! to keep the payloads small. The structs below give them readable names
//! and map back with `serde(rename)`. Every struct defaults missing fields,
//! so partial documents decode; no other validation is done.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Module id used by feature records that belong to no module.
pub const NO_MODULE: i32 = -1;

// ── Global summary ───────────────────────────────────────────────────────────

/// `global_summary.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSummary {
    pub total_features: u64,
    pub total_alive: u64,
    pub total_annotated: u64,
    pub total_modules: u64,
    pub total_novel: u64,
    pub n_layers: u32,
    pub n_features_per_layer: u32,
    pub layers: Vec<LayerSummary>,
}

impl GlobalSummary {
    pub fn layer(&self, layer: u32) -> Option<&LayerSummary> {
        self.layers.iter().find(|l| l.layer == layer)
    }
}

/// Per-layer aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSummary {
    pub layer: u32,
    pub alive: u32,
    pub dead: u32,
    pub annotated: u32,
    pub annotation_rate: f64,
    pub n_modules: u32,
    pub n_svd_aligned: u32,
    pub n_novel: u32,
    pub ontology_counts: OntologyCounts,
    pub mean_feature_cosine: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance_explained: Option<f64>,
}

/// Annotated feature counts per ontology source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyCounts {
    #[serde(rename = "GO_BP")]
    pub go_bp: u32,
    #[serde(rename = "KEGG")]
    pub kegg: u32,
    #[serde(rename = "Reactome")]
    pub reactome: u32,
    #[serde(rename = "STRING")]
    pub string: u32,
    #[serde(rename = "TRRUST")]
    pub trrust: u32,
}

impl OntologyCounts {
    /// Counts labelled with their ontology names, in display order.
    pub fn entries(&self) -> [(&'static str, u32); 5] {
        [
            ("GO_BP", self.go_bp),
            ("KEGG", self.kegg),
            ("Reactome", self.reactome),
            ("STRING", self.string),
            ("TRRUST", self.trrust),
        ]
    }

    pub fn total(&self) -> u32 {
        self.entries().iter().map(|(_, c)| c).sum()
    }
}

// ── Layer features ───────────────────────────────────────────────────────────

/// One entry of `layer_NN_features.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureRecord {
    #[serde(rename = "i")]
    pub id: u32,
    #[serde(rename = "d")]
    pub dead: bool,
    #[serde(rename = "f")]
    pub activation_freq: f64,
    #[serde(rename = "ma")]
    pub mean_activation: f64,
    #[serde(rename = "fc")]
    pub fire_count: u64,
    #[serde(rename = "na")]
    pub n_annotations: u32,
    #[serde(rename = "m")]
    pub module: i32,
    #[serde(rename = "sv")]
    pub svd_aligned: bool,
    /// Best (lowest adjusted p) annotation term, empty when unannotated
    #[serde(rename = "lb")]
    pub label: String,
    /// Ontology of the best annotation, `"none"` when unannotated
    #[serde(rename = "to")]
    pub top_ontology: String,
    #[serde(rename = "tg")]
    pub top_genes: Vec<GeneActivation>,
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Self {
            id: 0,
            dead: false,
            activation_freq: 0.0,
            mean_activation: 0.0,
            fire_count: 0,
            n_annotations: 0,
            module: NO_MODULE,
            svd_aligned: false,
            label: String::new(),
            top_ontology: "none".to_string(),
            top_genes: Vec::new(),
        }
    }
}

impl FeatureRecord {
    pub fn module_id(&self) -> Option<i32> {
        (self.module != NO_MODULE).then_some(self.module)
    }

    pub fn is_annotated(&self) -> bool {
        self.n_annotations > 0
    }

    pub fn gene_names(&self) -> impl Iterator<Item = &str> {
        self.top_genes.iter().map(|g| g.name.as_str())
    }
}

/// A gene with its mean activation on a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneActivation {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "a", default)]
    pub activation: f64,
    #[serde(rename = "fc", default, skip_serializing_if = "Option::is_none")]
    pub fire_count: Option<u64>,
}

/// `layer_NN_positions.json`: `[x, y]` per feature id.
pub type LayerPositions = Vec<[f64; 2]>;

// ── Layer annotations ────────────────────────────────────────────────────────

/// `layer_NN_annotations.json`, keyed by stringified feature id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerAnnotations(pub HashMap<String, FeatureAnnotations>);

impl LayerAnnotations {
    pub fn for_feature(&self, id: u32) -> Option<&FeatureAnnotations> {
        self.0.get(&id.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureAnnotations {
    pub genes: Vec<GeneActivation>,
    #[serde(rename = "anns")]
    pub annotations: Vec<Annotation>,
}

/// One ontology enrichment hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    #[serde(rename = "o")]
    pub ontology: String,
    #[serde(rename = "t")]
    pub term: String,
    #[serde(rename = "p")]
    pub p_value: f64,
    #[serde(rename = "or")]
    pub odds_ratio: f64,
    #[serde(rename = "n")]
    pub n_overlap: u32,
    #[serde(rename = "g")]
    pub overlap_genes: Vec<String>,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            ontology: String::new(),
            term: String::new(),
            p_value: 1.0,
            odds_ratio: 0.0,
            n_overlap: 0,
            overlap_genes: Vec::new(),
        }
    }
}

// ── Cell-type enrichment (optional) ──────────────────────────────────────────

/// `layer_NN_celltypes.json`. Not every layer has one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellTypeEnrichment {
    pub summary: CellTypeSummary,
    pub cell_type_meta: HashMap<String, CellTypeMeta>,
    pub features: HashMap<String, FeatureCellTypes>,
}

impl CellTypeEnrichment {
    pub fn for_feature(&self, id: u32) -> Option<&FeatureCellTypes> {
        self.features.get(&id.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellTypeSummary {
    pub n_cells: u32,
    pub tissues: Vec<String>,
    pub n_cell_types: u32,
    pub n_features_with_enrichment: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellTypeMeta {
    #[serde(rename = "n")]
    pub count: u32,
    /// Comma-joined tissue names
    #[serde(rename = "t")]
    pub tissues: String,
}

impl CellTypeMeta {
    pub fn tissue_list(&self) -> impl Iterator<Item = &str> {
        self.tissues.split(',').filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureCellTypes {
    #[serde(rename = "ct")]
    pub cell_types: Vec<CellTypeHit>,
    #[serde(rename = "ti")]
    pub tissues: Vec<TissueHit>,
    #[serde(rename = "tc")]
    pub top_cells: Vec<TopCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellTypeHit {
    #[serde(rename = "c")]
    pub cell_type: String,
    #[serde(rename = "p")]
    pub p_value: f64,
    #[serde(rename = "or")]
    pub odds_ratio: f64,
    #[serde(rename = "n")]
    pub n_top: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TissueHit {
    #[serde(rename = "t")]
    pub tissue: String,
    #[serde(rename = "p")]
    pub p_value: f64,
    #[serde(rename = "or")]
    pub odds_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopCell {
    #[serde(rename = "ct")]
    pub cell_type: String,
    #[serde(rename = "t")]
    pub tissue: String,
    #[serde(rename = "a")]
    pub activation: f64,
}

// ── Modules ──────────────────────────────────────────────────────────────────

/// One co-activation module from `modules.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Module {
    pub layer: u32,
    pub id: i32,
    #[serde(rename = "n")]
    pub size: u32,
    pub features: Vec<u32>,
    pub top_anns: Vec<ModuleAnnotation>,
}

/// A label shared by members of a module, with its member count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleAnnotation {
    #[serde(rename = "t")]
    pub term: String,
    #[serde(rename = "c")]
    pub count: u32,
}

// ── Cross-layer graph ────────────────────────────────────────────────────────

/// `cross_layer_graph.json`, keyed by layer pair (`"L00_L05"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossLayerGraph(pub BTreeMap<String, LayerPairGraph>);

impl CrossLayerGraph {
    pub fn pair(&self, pair: &LayerPair) -> Option<&LayerPairGraph> {
        self.0.get(&pair.to_string())
    }

    pub fn pairs(&self) -> Vec<LayerPair> {
        self.0.keys().filter_map(|k| k.parse().ok()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPairGraph {
    pub summary: Value,
    pub deps: Vec<FeatureDependencies>,
}

/// Top downstream dependencies of one upstream feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureDependencies {
    #[serde(rename = "a")]
    pub feature: u32,
    pub deps: Vec<Dependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependency {
    #[serde(rename = "b")]
    pub feature: u32,
    pub pmi: f64,
    #[serde(rename = "lb")]
    pub label: String,
}

/// Identifier of a cross-layer graph entry, e.g. `L05_L11`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerPair {
    pub upstream: u32,
    pub downstream: u32,
}

impl std::fmt::Display for LayerPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{:02}_L{:02}", self.upstream, self.downstream)
    }
}

impl FromStr for LayerPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| -> Option<u32> { part.strip_prefix('L')?.parse().ok() };
        let (a, b) = s
            .split_once('_')
            .ok_or_else(|| format!("invalid layer pair: {s}"))?;
        match (parse(a), parse(b)) {
            (Some(upstream), Some(downstream)) => Ok(Self { upstream, downstream }),
            _ => Err(format!("invalid layer pair: {s}")),
        }
    }
}

// ── Causal patching ──────────────────────────────────────────────────────────

/// `causal_patching.json`, computed for one designated layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalPatching {
    pub summary: Value,
    pub features: Vec<CausalFeature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalFeature {
    #[serde(rename = "i")]
    pub id: u32,
    #[serde(rename = "lb")]
    pub label: String,
    #[serde(rename = "na")]
    pub n_annotations: u32,
    #[serde(rename = "af")]
    pub activation_freq: f64,
    /// Passed through as written; entries are gene names or gene objects
    #[serde(rename = "tg")]
    pub top_genes: Vec<Value>,
    #[serde(rename = "td")]
    pub target_logit_diff: f64,
    #[serde(rename = "od")]
    pub other_logit_diff: f64,
    #[serde(rename = "sr")]
    pub specificity_ratio: f64,
}

impl CausalFeature {
    /// Gene names from `top_genes`, whichever form they were written in.
    pub fn gene_names(&self) -> Vec<&str> {
        self.top_genes
            .iter()
            .filter_map(|g| match g {
                Value::String(s) => Some(s.as_str()),
                Value::Object(o) => ["n", "gene_name", "gene"]
                    .iter()
                    .find_map(|k| o.get(*k).and_then(Value::as_str)),
                _ => None,
            })
            .collect()
    }
}

// ── Perturbation response ────────────────────────────────────────────────────

/// `perturbation_response.json`, computed for one designated layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationResponse {
    pub summary: Value,
    pub targets: Vec<PerturbationTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationTarget {
    pub gene: String,
    #[serde(rename = "tf")]
    pub is_tf: bool,
    #[serde(rename = "nk")]
    pub n_known_targets: u32,
    #[serde(rename = "nr")]
    pub n_responding: u32,
    #[serde(rename = "ns")]
    pub n_specific: u32,
    #[serde(rename = "top")]
    pub top_features: Vec<ChangedFeature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangedFeature {
    #[serde(rename = "i")]
    pub id: u32,
    #[serde(rename = "es")]
    pub effect_size: f64,
    #[serde(rename = "lb")]
    pub label: String,
}

// ── Baseline comparison ──────────────────────────────────────────────────────

/// `svd_comparison.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvdComparison {
    pub aggregate: Value,
    pub per_layer: BTreeMap<String, SvdLayerComparison>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvdLayerComparison {
    pub svd_variance: f64,
    pub sae_variance: f64,
    pub gain: f64,
    pub n_aligned: u32,
    pub n_novel: u32,
}

/// `cross_layer_tracking.json` is served as written.
pub type CrossLayerTracking = Value;

// ── Novel clusters ───────────────────────────────────────────────────────────

/// `novel_clusters.json`, keyed by layer number as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NovelClusters(pub BTreeMap<String, NovelLayerClusters>);

impl NovelClusters {
    pub fn for_layer(&self, layer: u32) -> Option<&NovelLayerClusters> {
        self.0.get(&layer.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NovelLayerClusters {
    pub summary: Value,
    pub clusters: Vec<Value>,
}

// ── Search indexes ───────────────────────────────────────────────────────────

/// `gene_index.json`: gene name → features whose top genes include it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneIndex(pub HashMap<String, Vec<GeneHit>>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneHit {
    #[serde(rename = "l")]
    pub layer: u32,
    #[serde(rename = "i")]
    pub feature: u32,
    /// Position of the gene in the feature's top-gene list
    #[serde(rename = "r")]
    pub rank: u32,
    #[serde(rename = "lb")]
    pub label: String,
    #[serde(rename = "m")]
    pub module: i32,
}

impl Default for GeneHit {
    fn default() -> Self {
        Self { layer: 0, feature: 0, rank: 0, label: String::new(), module: NO_MODULE }
    }
}

/// `ontology_index.json`: term → annotated features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OntologyIndex(pub HashMap<String, Vec<TermHit>>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermHit {
    #[serde(rename = "l")]
    pub layer: u32,
    #[serde(rename = "i")]
    pub feature: u32,
    #[serde(rename = "p")]
    pub p_value: f64,
    #[serde(rename = "o")]
    pub ontology: String,
}

impl Default for TermHit {
    fn default() -> Self {
        Self { layer: 0, feature: 0, p_value: 1.0, ontology: String::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_partial_global_summary_decodes() {
        let summary: GlobalSummary = serde_json::from_value(json!({
            "total_features": 82525,
            "layers": [{"layer": 0, "alive": 4000, "annotation_rate": 0.12}]
        }))
        .unwrap();
        assert_eq!(summary.total_features, 82525);
        assert_eq!(summary.layers[0].alive, 4000);
        assert_eq!(summary.layers[0].ontology_counts, OntologyCounts::default());
        assert!(summary.layer(0).is_some());
        assert!(summary.layer(1).is_none());
    }

    #[test]
    fn test_compact_feature_record_decodes() {
        let rec: FeatureRecord = serde_json::from_value(json!({
            "i": 42, "d": false, "f": 0.013, "ma": 1.7, "fc": 120, "na": 3, "m": 7,
            "sv": true, "lb": "DNA repair", "to": "GO_BP",
            "tg": [{"n": "TP53", "a": 0.91}, {"n": "MDM2", "a": 0.4}]
        }))
        .unwrap();
        assert_eq!(rec.id, 42);
        assert_eq!(rec.module_id(), Some(7));
        assert_eq!(rec.gene_names().collect::<Vec<_>>(), vec!["TP53", "MDM2"]);
    }

    #[test]
    fn test_missing_module_defaults_to_none() {
        let rec: FeatureRecord = serde_json::from_value(json!({"i": 1})).unwrap();
        assert_eq!(rec.module_id(), None);
        assert_eq!(rec.top_ontology, "none");
        assert!(!rec.is_annotated());
    }

    #[test]
    fn test_positions_decode_as_pairs() {
        let pos: LayerPositions = serde_json::from_value(json!([[0.1, -0.2], [1.0, 2.0]])).unwrap();
        assert_eq!(pos[1], [1.0, 2.0]);
    }

    #[test]
    fn test_annotations_lookup_by_id() {
        let anns: LayerAnnotations = serde_json::from_value(json!({
            "5": {"genes": [{"n": "GATA1", "a": 0.5, "fc": 12}],
                  "anns": [{"o": "KEGG", "t": "Heme biosynthesis", "p": 0.001, "or": 4.2, "n": 3, "g": ["ALAS2"]}]}
        }))
        .unwrap();
        let detail = anns.for_feature(5).unwrap();
        assert_eq!(detail.genes[0].fire_count, Some(12));
        assert_eq!(detail.annotations[0].term, "Heme biosynthesis");
        assert!(anns.for_feature(6).is_none());
    }

    #[test]
    fn test_layer_pair_parse_and_display() {
        let pair: LayerPair = "L05_L11".parse().unwrap();
        assert_eq!(pair, LayerPair { upstream: 5, downstream: 11 });
        assert_eq!(pair.to_string(), "L05_L11");
        assert!("05_11".parse::<LayerPair>().is_err());
        assert!("L05".parse::<LayerPair>().is_err());
    }

    #[test]
    fn test_causal_gene_names_accept_both_forms() {
        let feat: CausalFeature = serde_json::from_value(json!({
            "i": 3, "tg": ["HBG1", {"n": "HBG2"}, {"gene_name": "GATA1"}, 5]
        }))
        .unwrap();
        assert_eq!(feat.gene_names(), vec!["HBG1", "HBG2", "GATA1"]);
    }

    #[test]
    fn test_cell_type_meta_splits_tissues() {
        let meta = CellTypeMeta { count: 10, tissues: "blood,liver".into() };
        assert_eq!(meta.tissue_list().collect::<Vec<_>>(), vec!["blood", "liver"]);
        let empty = CellTypeMeta::default();
        assert_eq!(empty.tissue_list().count(), 0);
    }
}
