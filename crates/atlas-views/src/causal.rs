//! Causal patching ranking for the designated layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use atlas_common::artifacts::{CausalFeature, CausalPatching, FeatureRecord};

use crate::cmp_f64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CausalSort {
    #[default]
    SpecificityRatio,
    TargetLogitDiff,
    Annotations,
}

#[derive(Debug, Serialize)]
pub struct CausalRow<'a> {
    #[serde(flatten)]
    pub feature: &'a CausalFeature,
    pub genes: Vec<&'a str>,
    pub module: Option<i32>,
    pub dead: bool,
}

/// Causal features ordered by `sort`, descending, joined with the layer's
/// feature records. Features without a record get no module and are not dead.
pub fn rank_causal<'a>(
    patching: &'a CausalPatching,
    features: &[FeatureRecord],
    sort: CausalSort,
    limit: Option<usize>,
) -> Vec<CausalRow<'a>> {
    let by_id: HashMap<u32, &FeatureRecord> = features.iter().map(|f| (f.id, f)).collect();

    let mut ranked: Vec<&CausalFeature> = patching.features.iter().collect();
    ranked.sort_by(|a, b| match sort {
        CausalSort::SpecificityRatio => cmp_f64(b.specificity_ratio, a.specificity_ratio),
        CausalSort::TargetLogitDiff => cmp_f64(b.target_logit_diff, a.target_logit_diff),
        CausalSort::Annotations => b.n_annotations.cmp(&a.n_annotations),
    });

    ranked
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|feature| {
            let record = by_id.get(&feature.id);
            CausalRow {
                feature,
                genes: feature.gene_names(),
                module: record.and_then(|r| r.module_id()),
                dead: record.is_some_and(|r| r.dead),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_test_utils::fixtures;
    use pretty_assertions::assert_eq;

    fn sample() -> (CausalPatching, Vec<FeatureRecord>) {
        (
            serde_json::from_value(fixtures::causal_patching()).unwrap(),
            serde_json::from_value(fixtures::layer_features(1)).unwrap(),
        )
    }

    fn ids(rows: &[CausalRow<'_>]) -> Vec<u32> {
        rows.iter().map(|r| r.feature.id).collect()
    }

    #[test]
    fn test_sort_keys() {
        let (patching, features) = sample();
        assert_eq!(ids(&rank_causal(&patching, &features, CausalSort::SpecificityRatio, None)), vec![1, 5, 2]);
        assert_eq!(ids(&rank_causal(&patching, &features, CausalSort::TargetLogitDiff, None)), vec![2, 1, 5]);
        assert_eq!(ids(&rank_causal(&patching, &features, CausalSort::Annotations, Some(2))), vec![2, 5]);
    }

    #[test]
    fn test_join_attaches_module_and_genes() {
        let (patching, features) = sample();
        let rows = rank_causal(&patching, &features, CausalSort::default(), None);
        assert_eq!(rows[0].module, Some(0));
        assert_eq!(rows[0].genes, vec!["TP53", "MDM2"]);
        assert_eq!(rows[2].genes, vec!["TP53BP1"]);

        let rows = rank_causal(&patching, &[], CausalSort::default(), None);
        assert_eq!(rows[0].module, None);
        assert!(!rows[0].dead);
    }
}
