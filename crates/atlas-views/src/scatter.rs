//! UMAP scatter: positions joined with feature records.

use std::collections::HashMap;

use serde::Serialize;

use atlas_common::artifacts::{FeatureRecord, LayerPositions};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint<'a> {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub module: Option<i32>,
    pub label: &'a str,
    pub ontology: &'a str,
    pub dead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Position `i` belongs to feature id `i`. Positions without a record are
/// dropped.
pub fn scatter_points<'a>(positions: &LayerPositions, features: &'a [FeatureRecord]) -> Vec<ScatterPoint<'a>> {
    let by_id: HashMap<u32, &FeatureRecord> = features.iter().map(|f| (f.id, f)).collect();

    positions
        .iter()
        .enumerate()
        .filter_map(|(i, [x, y])| {
            let record: &'a FeatureRecord = *by_id.get(&u32::try_from(i).ok()?)?;
            Some(ScatterPoint {
                id: record.id,
                x: *x,
                y: *y,
                module: record.module_id(),
                label: &record.label,
                ontology: &record.top_ontology,
                dead: record.dead,
            })
        })
        .collect()
}

/// Extent of the points, `None` when there are none.
pub fn bounds(points: &[ScatterPoint<'_>]) -> Option<Bounds> {
    let first = points.first()?;
    let init = Bounds { min_x: first.x, max_x: first.x, min_y: first.y, max_y: first.y };
    Some(points.iter().fold(init, |b, p| Bounds {
        min_x: b.min_x.min(p.x),
        max_x: b.max_x.max(p.x),
        min_y: b.min_y.min(p.y),
        max_y: b.max_y.max(p.y),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_test_utils::fixtures::feature;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_join_by_position_index() {
        let features = vec![feature(0, 0, &[]), feature(2, 1, &["TP53"])];
        let positions = vec![[0.0, 1.0], [5.0, 5.0], [-2.0, 3.0]];

        let points = scatter_points(&positions, &features);
        assert_eq!(points.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!((points[1].x, points[1].y), (-2.0, 3.0));
        assert_eq!(points[1].module, None);
        assert_eq!(points[1].ontology, "none");
    }

    #[test]
    fn test_bounds() {
        let features = vec![feature(0, 0, &[]), feature(1, 0, &[])];
        let points = scatter_points(&vec![[1.0, -1.0], [-3.0, 4.0]], &features);
        assert_eq!(
            bounds(&points),
            Some(Bounds { min_x: -3.0, max_x: 1.0, min_y: -1.0, max_y: 4.0 })
        );
        assert_eq!(bounds(&[]), None);
    }
}
