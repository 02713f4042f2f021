//! Connectivity merger: joins directly-connected fragments that share an
//! attribute key into maximal polylines.
//!
//! Coordinate equality is exact. Fragments descend from a shared
//! topological source, so shared endpoints are bit-identical; any upstream
//! perturbation breaks chains apart instead of merging wrongly.

use geo::{Coord, LineString};

/// Merge fragments of one attribute group into maximal end-to-start chains.
///
/// Repeatedly pops a fragment as the current chain, then scans the rest for
/// one whose start equals the chain's end (append) or whose end equals the
/// chain's start (prepend), until no fragment extends the chain. Quadratic
/// in group size, which stays small in practice (bounded by attribute
/// cardinality); an endpoint-keyed map would bring this to O(n) if that
/// ever changes.
pub fn merge_connected(fragments: Vec<LineString<f64>>) -> Vec<LineString<f64>> {
    let mut pending: Vec<Vec<Coord<f64>>> =
        fragments.into_iter().map(|ls| ls.0).collect();
    let mut merged = Vec::new();

    while !pending.is_empty() {
        let mut chain = pending.remove(0);
        loop {
            let next = pending.iter().position(|cand| {
                cand.first() == chain.last() || cand.last() == chain.first()
            });
            let Some(i) = next else { break };
            let cand = pending.remove(i);
            if cand.first() == chain.last() {
                chain.extend_from_slice(&cand[1..]);
            } else {
                let mut prepended = cand[..cand.len() - 1].to_vec();
                prepended.extend_from_slice(&chain);
                chain = prepended;
            }
        }
        merged.push(LineString::new(chain));
    }

    merged
}
