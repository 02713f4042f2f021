//! Containment matcher & aggregator.
//!
//! Reference edges are processed in ascending id order, each greedily
//! claiming the not-yet-claimed units fully contained in its buffer. The
//! claim is order-dependent by contract: a unit covered by two buffers goes
//! to the lower-id edge, and that disambiguation policy is part of the
//! pipeline's specified behavior, not an accident of iteration order.

use crate::buffer::BufferIndex;
use crate::types::{AggregatedEdge, DetailedUnit};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use log::debug;

/// Run the sequential claim-and-aggregate pass.
///
/// Returns one [`AggregatedEdge`] per reference edge (ascending id; an edge
/// claiming nothing gets value 0.0 and an empty claim list) plus the final
/// claim set for orphan reporting.
pub fn match_and_aggregate(
    index: &BufferIndex,
    units: &[DetailedUnit],
) -> (Vec<AggregatedEdge>, AHashSet<u64>) {
    // The notebook-era spatial join: one pass over units, envelope query
    // against the buffer index, exact containment per candidate pair.
    // Units are visited in id order, so each edge's candidate list comes
    // out ascending by unit id.
    let mut candidates_by_edge: AHashMap<u64, Vec<&DetailedUnit>> = AHashMap::new();
    for unit in units {
        for edge in index.candidates(&unit.geometry) {
            if edge.contains(&unit.geometry) {
                candidates_by_edge.entry(edge.id).or_default().push(unit);
            }
        }
    }

    let mut claimed: AHashSet<u64> = AHashSet::new();
    let mut out = Vec::with_capacity(index.len());

    for edge in index.edges_ascending() {
        let newly_claimed: Vec<&DetailedUnit> = candidates_by_edge
            .get(&edge.id)
            .map(|cands| {
                cands
                    .iter()
                    .filter(|u| !claimed.contains(&u.id))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        let mut claimed_unit_ids = Vec::with_capacity(newly_claimed.len());
        for unit in &newly_claimed {
            claimed.insert(unit.id);
            claimed_unit_ids.push(unit.id);
        }

        let aggregated_value = aggregate_value(&newly_claimed);
        debug!(
            "edge {}: claimed {} unit(s), aggregated value {:.3}",
            edge.id,
            claimed_unit_ids.len(),
            aggregated_value
        );

        out.push(AggregatedEdge {
            id: edge.id,
            geometry: edge.geometry.clone(),
            aggregated_value,
            claimed_unit_ids,
        });
    }

    (out, claimed)
}

/// Aggregate the claimed units of one edge.
///
/// Units sharing an origin are collinear fragments of one pre-split line;
/// averaging them (rather than summing) keeps that line from counting more
/// than once. The survivors collapse per secondary key the same way, so
/// parallel duplicate representations of one road contribute a single
/// value; a unit with a unique secondary key contributes its raw value.
fn aggregate_value(units: &[&DetailedUnit]) -> f64 {
    let mut total = 0.0;
    let mut singles: Vec<&DetailedUnit> = Vec::new();

    let by_origin = units
        .iter()
        .map(|u| (u.origin_id, *u))
        .into_group_map();
    for origin_id in by_origin.keys().sorted() {
        let group = &by_origin[origin_id];
        if group.len() > 1 {
            total += length_weighted_mean(group);
        } else {
            singles.push(group[0]);
        }
    }

    let by_secondary = singles
        .iter()
        .map(|u| (u.secondary_key, *u))
        .into_group_map();
    for key in by_secondary.keys().sorted() {
        let group = &by_secondary[key];
        if group.len() > 1 {
            total += length_weighted_mean(group);
        } else {
            total += group[0].primary_value;
        }
    }

    total
}

/// Σ(value × length) / Σ(length) over a group; 0 when the total length is 0.
fn length_weighted_mean(group: &[&DetailedUnit]) -> f64 {
    let total_length: f64 = group.iter().map(|u| u.length()).sum();
    if total_length == 0.0 {
        return 0.0;
    }
    group.iter().map(|u| u.mass()).sum::<f64>() / total_length
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use ordered_float::OrderedFloat;

    fn unit(
        id: u64,
        origin_id: u64,
        coords: Vec<(f64, f64)>,
        primary_value: f64,
        secondary_key: f64,
    ) -> DetailedUnit {
        DetailedUnit {
            id,
            geometry: LineString::from(coords),
            primary_value,
            secondary_key: OrderedFloat(secondary_key),
            origin_id,
        }
    }

    fn straight_reference(ids: &[u64]) -> Vec<(u64, LineString<f64>)> {
        ids.iter()
            .map(|&id| (id, LineString::from(vec![(0.0, 0.0), (10.0, 0.0)])))
            .collect()
    }

    #[test]
    fn duplicate_origin_groups_average_not_sum() {
        let index = BufferIndex::build(&straight_reference(&[0]), 1.0).unwrap();
        let units = vec![
            unit(0, 7, vec![(0.0, 0.0), (2.0, 0.0)], 10.0, 1.0),
            unit(1, 7, vec![(2.0, 0.0), (5.0, 0.0)], 20.0, 1.0),
            unit(2, 7, vec![(5.0, 0.0), (10.0, 0.0)], 30.0, 1.0),
        ];
        let (edges, claimed) = match_and_aggregate(&index, &units);
        assert_eq!(edges.len(), 1);
        // (2*10 + 3*20 + 5*30) / 10 = 23, not the naive 60.
        assert_eq!(edges[0].aggregated_value, 23.0);
        assert_eq!(edges[0].claimed_unit_ids, vec![0, 1, 2]);
        assert_eq!(claimed.len(), 3);
    }

    #[test]
    fn shared_secondary_key_collapses_singletons_stay_raw() {
        let index = BufferIndex::build(&straight_reference(&[0]), 1.0).unwrap();
        // Two parallel representations with secondary key 5.0 (distinct
        // origins), one independent unit with key 9.0.
        let units = vec![
            unit(0, 1, vec![(0.0, 0.0), (10.0, 0.0)], 12.0, 5.0),
            unit(1, 2, vec![(0.0, 0.5), (10.0, 0.5)], 20.0, 5.0),
            unit(2, 3, vec![(0.0, -0.5), (10.0, -0.5)], 7.0, 9.0),
        ];
        let (edges, _) = match_and_aggregate(&index, &units);
        // Key 5.0 collapses to its length-weighted mean (equal lengths ->
        // 16.0); key 9.0 contributes its raw value.
        assert_eq!(edges[0].aggregated_value, 16.0 + 7.0);
    }

    #[test]
    fn claims_are_exclusive_across_edges() {
        // Two identical reference edges: both buffers contain both units.
        let index = BufferIndex::build(&straight_reference(&[0, 1]), 1.0).unwrap();
        let units = vec![
            unit(0, 0, vec![(0.0, 0.0), (4.0, 0.0)], 5.0, 1.0),
            unit(1, 1, vec![(4.0, 0.0), (10.0, 0.0)], 5.0, 2.0),
        ];
        let (edges, _) = match_and_aggregate(&index, &units);
        assert_eq!(edges[0].claimed_unit_ids, vec![0, 1]);
        assert!(edges[1].claimed_unit_ids.is_empty());
        assert_eq!(edges[1].aggregated_value, 0.0);
    }

    #[test]
    fn lower_id_edge_wins_regardless_of_input_order() {
        let unit_list = vec![unit(0, 0, vec![(1.0, 0.0), (9.0, 0.0)], 5.0, 1.0)];

        // Ascending ids in input order.
        let index = BufferIndex::build(&straight_reference(&[3, 8]), 1.0).unwrap();
        let (edges, _) = match_and_aggregate(&index, &unit_list);
        assert_eq!(edges[0].id, 3);
        assert_eq!(edges[0].claimed_unit_ids, vec![0]);
        assert!(edges[1].claimed_unit_ids.is_empty());

        // Same geometries with the id labels swapped: the claim follows
        // the lower id, i.e. the other edge now wins.
        let index = BufferIndex::build(&straight_reference(&[8, 3]), 1.0).unwrap();
        let (edges, _) = match_and_aggregate(&index, &unit_list);
        assert_eq!(edges[0].id, 3);
        assert_eq!(edges[0].claimed_unit_ids, vec![0]);
    }

    #[test]
    fn uncovered_edge_yields_zero_not_error() {
        let reference = vec![
            (0, LineString::from(vec![(0.0, 0.0), (10.0, 0.0)])),
            (1, LineString::from(vec![(500.0, 500.0), (510.0, 500.0)])),
        ];
        let index = BufferIndex::build(&reference, 1.0).unwrap();
        let units = vec![unit(0, 0, vec![(0.0, 0.0), (10.0, 0.0)], 5.0, 1.0)];
        let (edges, _) = match_and_aggregate(&index, &units);
        assert_eq!(edges[1].aggregated_value, 0.0);
        assert!(edges[1].claimed_unit_ids.is_empty());
    }
}
