//! Feature table: filter, sort and page one layer's feature records.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use atlas_common::artifacts::FeatureRecord;

use crate::{cmp_f64, needle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Annotations,
    ActivationFreq,
    MeanActivation,
    FireCount,
    Id,
}

/// Filters and ordering for the feature table. Blank string filters are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureQuery {
    /// Case-insensitive substring of any top-gene name
    pub gene: Option<String>,
    /// Case-insensitive substring of the label, or of the feature id
    pub text: Option<String>,
    /// Exact top-ontology name
    pub ontology: Option<String>,
    pub module: Option<i32>,
    /// Unset: dead features are listed only when a gene filter is active
    pub include_dead: Option<bool>,
    pub min_annotations: u32,
    pub sort: SortKey,
    pub descending: bool,
    pub limit: Option<usize>,
}

impl Default for FeatureQuery {
    fn default() -> Self {
        Self {
            gene: None,
            text: None,
            ontology: None,
            module: None,
            include_dead: None,
            min_annotations: 0,
            sort: SortKey::Annotations,
            descending: true,
            limit: None,
        }
    }
}

impl FeatureQuery {
    pub fn gene(gene: impl Into<String>) -> Self {
        Self { gene: Some(gene.into()), ..Self::default() }
    }
}

/// One page of the feature table. `total` counts all matches before `limit`.
#[derive(Debug, Serialize)]
pub struct FeaturePage<'a> {
    pub total: usize,
    pub features: Vec<&'a FeatureRecord>,
}

/// Apply `query` to `features`.
///
/// Sorting is stable: records that tie on the sort key keep their order in
/// the input array.
pub fn query_features<'a>(features: &'a [FeatureRecord], query: &FeatureQuery) -> FeaturePage<'a> {
    let gene = needle(query.gene.as_deref());
    let text = needle(query.text.as_deref());
    let ontology = query.ontology.as_deref().map(str::trim).filter(|o| !o.is_empty());
    let include_dead = query.include_dead.unwrap_or(gene.is_some());

    let mut matched: Vec<&FeatureRecord> = features
        .iter()
        .filter(|f| include_dead || !f.dead)
        .filter(|f| f.n_annotations >= query.min_annotations)
        .filter(|f| query.module.map_or(true, |m| f.module == m))
        .filter(|f| ontology.map_or(true, |o| f.top_ontology == o))
        .filter(|f| {
            gene.as_deref()
                .map_or(true, |g| f.gene_names().any(|n| n.to_lowercase().contains(g)))
        })
        .filter(|f| {
            text.as_deref().map_or(true, |t| {
                f.label.to_lowercase().contains(t) || f.id.to_string().contains(t)
            })
        })
        .collect();

    matched.sort_by(|a, b| {
        let ord = compare(a, b, query.sort);
        if query.descending {
            ord.reverse()
        } else {
            ord
        }
    });

    let total = matched.len();
    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    FeaturePage { total, features: matched }
}

fn compare(a: &FeatureRecord, b: &FeatureRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Annotations => a.n_annotations.cmp(&b.n_annotations),
        SortKey::ActivationFreq => cmp_f64(a.activation_freq, b.activation_freq),
        SortKey::MeanActivation => cmp_f64(a.mean_activation, b.mean_activation),
        SortKey::FireCount => a.fire_count.cmp(&b.fire_count),
        SortKey::Id => a.id.cmp(&b.id),
    }
}
