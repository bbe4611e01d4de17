//! Feature detail panel.

use std::collections::BTreeMap;

use serde::Serialize;

use atlas_common::artifacts::{
    Annotation, CellTypeEnrichment, CellTypeMeta, FeatureCellTypes, FeatureRecord, GeneActivation,
    GeneIndex, LayerAnnotations, Module,
};

use crate::cmp_f64;
use crate::modules::find_module;

/// Cross-layer occurrences listed per top gene.
pub const MAX_OCCURRENCES_PER_GENE: usize = 20;

/// Artifacts the detail panel draws from, all for the same layer except the
/// gene index.
#[derive(Debug, Clone, Copy)]
pub struct DetailInputs<'a> {
    pub features: &'a [FeatureRecord],
    pub annotations: &'a LayerAnnotations,
    pub cell_types: Option<&'a CellTypeEnrichment>,
    pub modules: &'a [Module],
    pub gene_index: &'a GeneIndex,
}

#[derive(Debug, Serialize)]
pub struct CellTypePanel<'a> {
    #[serde(flatten)]
    pub enrichment: &'a FeatureCellTypes,
    /// Metadata of the enriched cell types
    pub meta: BTreeMap<&'a str, &'a CellTypeMeta>,
}

/// Another feature whose top genes include one of this feature's genes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneOccurrence<'a> {
    pub gene: &'a str,
    pub layer: u32,
    pub feature: u32,
    pub rank: u32,
    pub label: &'a str,
}

#[derive(Debug, Serialize)]
pub struct FeatureDetail<'a> {
    pub layer: u32,
    pub feature: &'a FeatureRecord,
    pub genes: &'a [GeneActivation],
    /// Sorted by adjusted p-value, most significant first
    pub annotations: Vec<&'a Annotation>,
    pub cell_types: Option<CellTypePanel<'a>>,
    pub module: Option<&'a Module>,
    pub gene_occurrences: Vec<GeneOccurrence<'a>>,
}

/// Assemble the detail panel for feature `id`, or `None` if the layer has no
/// such record.
pub fn feature_detail<'a>(layer: u32, id: u32, inputs: DetailInputs<'a>) -> Option<FeatureDetail<'a>> {
    let feature = inputs.features.iter().find(|f| f.id == id)?;
    let extra = inputs.annotations.for_feature(id);

    let genes: &[GeneActivation] = match extra {
        Some(a) if !a.genes.is_empty() => &a.genes,
        _ => &feature.top_genes,
    };

    let mut annotations: Vec<&Annotation> = extra.map(|a| a.annotations.iter().collect()).unwrap_or_default();
    annotations.sort_by(|a, b| cmp_f64(a.p_value, b.p_value));

    let cell_types = inputs.cell_types.and_then(|ct| {
        let enrichment = ct.for_feature(id)?;
        let meta = enrichment
            .cell_types
            .iter()
            .filter_map(|hit| {
                let (name, meta) = ct.cell_type_meta.get_key_value(&hit.cell_type)?;
                Some((name.as_str(), meta))
            })
            .collect();
        Some(CellTypePanel { enrichment, meta })
    });

    let module = feature
        .module_id()
        .and_then(|m| find_module(inputs.modules, layer, m));

    let gene_occurrences = feature
        .top_genes
        .iter()
        .flat_map(move |g| {
            let hits = inputs
                .gene_index
                .0
                .get_key_value(&g.name)
                .map(|(name, hits)| (name.as_str(), hits.as_slice()));
            hits.into_iter().flat_map(move |(name, hits)| {
                hits.iter()
                    .filter(move |h| !(h.layer == layer && h.feature == id))
                    .take(MAX_OCCURRENCES_PER_GENE)
                    .map(move |h| GeneOccurrence {
                        gene: name,
                        layer: h.layer,
                        feature: h.feature,
                        rank: h.rank,
                        label: &h.label,
                    })
            })
        })
        .collect();

    Some(FeatureDetail {
        layer,
        feature,
        genes,
        annotations,
        cell_types,
        module,
        gene_occurrences,
    })
}
