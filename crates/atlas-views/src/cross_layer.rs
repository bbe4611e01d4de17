//! Dependency lookups in the cross-layer PMI graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use atlas_common::artifacts::{CrossLayerGraph, Dependency, LayerPair};

use crate::cmp_f64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DependencyQuery {
    /// Feature id in the upstream layer whose dependents to list
    pub upstream: Option<u32>,
    /// Feature id in the downstream layer whose sources to list
    pub downstream: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamLink {
    pub feature: u32,
    pub pmi: f64,
}

#[derive(Debug, Serialize)]
pub struct DependencyLookup<'a> {
    pub pair: String,
    pub summary: &'a Value,
    /// Upstream feature ids that have recorded dependencies
    pub upstream_features: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_of: Option<Vec<&'a Dependency>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_of: Option<Vec<UpstreamLink>>,
}

/// Resolve `query` against the graph of `pair`. `None` when the pair is not
/// in the graph.
pub fn dependency_lookup<'a>(
    graph: &'a CrossLayerGraph,
    pair: &LayerPair,
    query: DependencyQuery,
) -> Option<DependencyLookup<'a>> {
    let entry = graph.pair(pair)?;

    let downstream_of = query.upstream.map(|a| {
        let mut deps: Vec<&Dependency> = entry
            .deps
            .iter()
            .filter(|d| d.feature == a)
            .flat_map(|d| d.deps.iter())
            .collect();
        deps.sort_by(|x, y| cmp_f64(y.pmi, x.pmi));
        deps
    });

    let upstream_of = query.downstream.map(|b| {
        let mut links: Vec<UpstreamLink> = entry
            .deps
            .iter()
            .flat_map(|d| {
                d.deps
                    .iter()
                    .filter(move |dep| dep.feature == b)
                    .map(move |dep| UpstreamLink { feature: d.feature, pmi: dep.pmi })
            })
            .collect();
        links.sort_by(|x, y| cmp_f64(y.pmi, x.pmi));
        links
    });

    Some(DependencyLookup {
        pair: pair.to_string(),
        summary: &entry.summary,
        upstream_features: entry.deps.iter().map(|d| d.feature).collect(),
        downstream_of,
        upstream_of,
    })
}
