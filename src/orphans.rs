//! Orphan reporter: units no reference edge claimed, and how much
//! attribute mass they carry.

use crate::types::{DetailedUnit, OrphanReport};
use ahash::AHashSet;
use std::collections::BTreeSet;

/// Set difference between all unit ids and the claimed ids. A non-empty
/// orphan set is not fatal, but it is unattributed network mass and the
/// caller must see it.
pub fn orphan_report(units: &[DetailedUnit], claimed: &AHashSet<u64>) -> OrphanReport {
    let mut unit_ids = BTreeSet::new();
    let mut total_mass = 0.0;
    for unit in units {
        if !claimed.contains(&unit.id) {
            unit_ids.insert(unit.id);
            total_mass += unit.mass();
        }
    }
    OrphanReport {
        unit_ids,
        total_mass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use ordered_float::OrderedFloat;

    fn unit(id: u64, value: f64, len: f64) -> DetailedUnit {
        DetailedUnit {
            id,
            geometry: LineString::from(vec![(0.0, 0.0), (len, 0.0)]),
            primary_value: value,
            secondary_key: OrderedFloat(1.0),
            origin_id: id,
        }
    }

    #[test]
    fn reports_unclaimed_units_and_their_mass() {
        let units = vec![unit(0, 2.0, 10.0), unit(1, 3.0, 4.0), unit(2, 1.0, 5.0)];
        let claimed: AHashSet<u64> = [0, 2].into_iter().collect();
        let report = orphan_report(&units, &claimed);
        assert_eq!(report.unit_ids, BTreeSet::from([1]));
        assert!((report.total_mass - 12.0).abs() < 1e-12);
    }

    #[test]
    fn no_orphans_when_everything_claimed() {
        let units = vec![unit(0, 2.0, 10.0)];
        let claimed: AHashSet<u64> = [0].into_iter().collect();
        let report = orphan_report(&units, &claimed);
        assert!(report.unit_ids.is_empty());
        assert_eq!(report.total_mass, 0.0);
    }
}
