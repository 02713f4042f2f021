//! Mass-conservation checker: Σ(value × length) before and after
//! conflation, reported for validation and regression comparison.

use crate::types::{AggregatedEdge, DetailedUnit, MassReport};

/// Σ primary_value × length over the full unit set (pre-conflation).
pub fn input_mass(units: &[DetailedUnit]) -> f64 {
    units.iter().map(|u| u.mass()).sum()
}

/// Σ aggregated_value × reference length over all edges (post-conflation).
pub fn output_mass(edges: &[AggregatedEdge]) -> f64 {
    edges
        .iter()
        .map(|e| e.aggregated_value * e.length())
        .sum()
}

/// Both totals side by side. Equality is not enforced: orphan mass and the
/// length-weighted aggregation policy legitimately create a gap, and tests
/// assert their own tolerance bounds.
pub fn mass_report(units: &[DetailedUnit], edges: &[AggregatedEdge]) -> MassReport {
    MassReport {
        input_mass: input_mass(units),
        output_mass: output_mass(edges),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use ordered_float::OrderedFloat;

    #[test]
    fn masses_are_value_times_length() {
        let units = vec![DetailedUnit {
            id: 0,
            geometry: LineString::from(vec![(0.0, 0.0), (3.0, 4.0)]),
            primary_value: 2.0,
            secondary_key: OrderedFloat(1.0),
            origin_id: 0,
        }];
        let edges = vec![AggregatedEdge {
            id: 0,
            geometry: LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]),
            aggregated_value: 1.5,
            claimed_unit_ids: vec![0],
        }];
        let report = mass_report(&units, &edges);
        assert!((report.input_mass - 10.0).abs() < 1e-12);
        assert!((report.output_mass - 15.0).abs() < 1e-12);
        assert!((report.gap() + 5.0).abs() < 1e-12);
    }
}
