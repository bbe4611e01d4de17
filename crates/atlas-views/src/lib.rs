//! atlas-views: what each explorer page shows, computed from loaded artifacts.
//!
//! Every function here is pure. Callers load the artifacts through
//! `atlas-data` and pass borrowed views in; results borrow from the inputs
//! where they can and serialize straight to the JSON API.

pub mod baseline;
pub mod causal;
pub mod cross_layer;
pub mod detail;
pub mod features;
pub mod modules;
pub mod overview;
pub mod perturbation;
pub mod scatter;
pub mod search;

pub use features::{FeaturePage, FeatureQuery, SortKey};

use std::cmp::Ordering;

/// Total order for floats; NaN compares equal.
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Case-insensitive needle, or `None` when blank.
pub(crate) fn needle(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
}
