//! Perturbation response ranking.

use serde::{Deserialize, Serialize};

use atlas_common::artifacts::{PerturbationResponse, PerturbationTarget};

use crate::needle;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationQuery {
    pub tf_only: bool,
    /// Case-insensitive substring of the target gene
    pub gene: Option<String>,
    pub limit: Option<usize>,
}

/// Targets with the most specifically responding features first. Ties keep
/// file order.
pub fn rank_perturbations<'a>(
    response: &'a PerturbationResponse,
    query: &PerturbationQuery,
) -> Vec<&'a PerturbationTarget> {
    let gene = needle(query.gene.as_deref());
    let mut ranked: Vec<&PerturbationTarget> = response
        .targets
        .iter()
        .filter(|t| !query.tf_only || t.is_tf)
        .filter(|t| gene.as_deref().map_or(true, |g| t.gene.to_lowercase().contains(g)))
        .collect();

    ranked.sort_by(|a, b| b.n_specific.cmp(&a.n_specific));
    if let Some(limit) = query.limit {
        ranked.truncate(limit);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_test_utils::fixtures;
    use pretty_assertions::assert_eq;

    fn genes(targets: &[&PerturbationTarget]) -> Vec<String> {
        targets.iter().map(|t| t.gene.clone()).collect()
    }

    #[test]
    fn test_ranking_and_filters() {
        let response: PerturbationResponse = serde_json::from_value(fixtures::perturbation_response()).unwrap();

        let all = rank_perturbations(&response, &PerturbationQuery::default());
        assert_eq!(genes(&all), vec!["GATA1", "TP53", "HBB"]);

        let tf = PerturbationQuery { tf_only: true, ..Default::default() };
        assert_eq!(genes(&rank_perturbations(&response, &tf)), vec!["GATA1", "TP53"]);

        let by_gene = PerturbationQuery { gene: Some("hb".into()), ..Default::default() };
        assert_eq!(genes(&rank_perturbations(&response, &by_gene)), vec!["HBB"]);

        let limited = PerturbationQuery { limit: Some(1), ..Default::default() };
        assert_eq!(genes(&rank_perturbations(&response, &limited)), vec!["GATA1"]);
    }
}
