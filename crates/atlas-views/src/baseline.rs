//! SAE versus SVD baseline comparison table.

use serde::Serialize;

use atlas_common::artifacts::{SvdComparison, SvdLayerComparison};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SvdRow<'a> {
    pub layer: u32,
    #[serde(flatten)]
    pub comparison: &'a SvdLayerComparison,
}

/// Per-layer rows ordered by the layer number in each key (`"3"`, `"L03"`
/// and `"layer_3"` all mean layer 3). Keys without digits are skipped.
pub fn svd_rows(comparison: &SvdComparison) -> Vec<SvdRow<'_>> {
    let mut rows: Vec<SvdRow<'_>> = comparison
        .per_layer
        .iter()
        .filter_map(|(key, c)| Some(SvdRow { layer: layer_number(key)?, comparison: c }))
        .collect();
    rows.sort_by_key(|r| r.layer);
    rows
}

fn layer_number(key: &str) -> Option<u32> {
    let digits: String = key.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
