//! End-to-end conflation pipeline.
//!
//! Raw attributed lines -> connectivity merge -> angle segmentation ->
//! buffer index -> containment matching & aggregation -> orphan and
//! mass-conservation reports. Merging, segmentation and buffer
//! construction are independent per group/line/edge and run in parallel;
//! the matching pass is sequential because the claim set is shared mutable
//! state with an order-dependent contract.

use crate::buffer::BufferIndex;
use crate::config::ConflateConfig;
use crate::error::ConflateError;
use crate::geometry::geometry_kind;
use crate::mass::mass_report;
use crate::matcher::match_and_aggregate;
use crate::merge::merge_connected;
use crate::orphans::orphan_report;
use crate::segment::split_linestring;
use crate::types::{
    AttrKey, ConflationOutput, DetailedLine, DetailedUnit, MergedLine, SkipStage, SkippedLine,
};
use ahash::AHashMap;
use geo::{Geometry, LineString};
use log::{debug, info};
use rayon::prelude::*;

/// Conflate a detailed network onto a reference network.
///
/// `reference` pairs a stable edge id with its geometry; ascending id is
/// the canonical (and tested) claim order. Geometry-level problems in
/// individual detailed lines are returned in
/// [`ConflationOutput::skipped`]; empty inputs, an invalid config and
/// degenerate reference edges are fatal.
pub fn conflate(
    detailed: &[DetailedLine],
    reference: &[(u64, LineString<f64>)],
    config: &ConflateConfig,
) -> Result<ConflationOutput, ConflateError> {
    validate_config(config)?;
    if detailed.is_empty() {
        return Err(ConflateError::EmptyInput("no detailed lines supplied"));
    }
    if reference.is_empty() {
        return Err(ConflateError::EmptyInput("no reference edges supplied"));
    }

    let mut skipped: Vec<SkippedLine> = Vec::new();

    // Stage 1: validate and explode inputs into per-attribute fragment
    // groups.
    let groups = explode_into_groups(detailed, &mut skipped);
    info!(
        "conflate: {} detailed line(s) -> {} attribute group(s), {} skipped at input",
        detailed.len(),
        groups.len(),
        skipped.len()
    );

    // Stage 2: merge directly-connected fragments within each group.
    // Groups are independent; keep their sorted order so origin ids come
    // out deterministic.
    let merged_per_group: Vec<(AttrKey, Vec<LineString<f64>>)> = groups
        .into_par_iter()
        .map(|(key, fragments)| (key, merge_connected(fragments)))
        .collect();

    let mut merged: Vec<MergedLine> = Vec::new();
    for (key, lines) in merged_per_group {
        for geometry in lines {
            merged.push(MergedLine {
                origin_id: merged.len() as u64,
                geometry,
                primary_value: key.primary.into_inner(),
                secondary_key: key.secondary,
            });
        }
    }
    info!("conflate: merged into {} line(s)", merged.len());

    // Stage 3: angle segmentation, independent per merged line. Failures
    // stay per-line.
    let split_results: Vec<Result<Vec<LineString<f64>>, ConflateError>> = merged
        .par_iter()
        .map(|line| split_linestring(&line.geometry, config))
        .collect();

    let mut units: Vec<DetailedUnit> = Vec::new();
    for (line, result) in merged.iter().zip(split_results) {
        match result {
            Ok(segments) => {
                for geometry in segments {
                    units.push(DetailedUnit {
                        id: units.len() as u64,
                        geometry,
                        primary_value: line.primary_value,
                        secondary_key: line.secondary_key,
                        origin_id: line.origin_id,
                    });
                }
            }
            Err(reason) => {
                debug!(
                    "conflate: skipping merged line {} at segmentation: {}",
                    line.origin_id, reason
                );
                skipped.push(SkippedLine {
                    stage: SkipStage::Segmentation,
                    index: line.origin_id,
                    reason,
                });
            }
        }
    }
    if units.is_empty() {
        return Err(ConflateError::EmptyInput(
            "no detailed units survived preprocessing",
        ));
    }
    info!("conflate: {} matchable unit(s)", units.len());

    // Stage 4: buffer index over the reference edges.
    let index = BufferIndex::build(reference, config.buffer_tolerance)?;

    // Stage 5: sequential claim-and-aggregate pass.
    let (edges, claimed) = match_and_aggregate(&index, &units);

    // Stage 6: diagnostics.
    let orphans = orphan_report(&units, &claimed);
    let mass = mass_report(&units, &edges);
    info!(
        "conflate: {} edge(s) aggregated, {} orphan unit(s), mass {:.1} -> {:.1}",
        edges.len(),
        orphans.unit_ids.len(),
        mass.input_mass,
        mass.output_mass
    );

    Ok(ConflationOutput {
        edges,
        orphans,
        mass,
        skipped,
    })
}

/// Reject parameter values that have no meaningful pipeline behavior. The
/// length cap in particular must be finite and positive or the capping
/// loop cannot make progress.
fn validate_config(config: &ConflateConfig) -> Result<(), ConflateError> {
    if !(config.max_segment_length > 0.0) || !config.max_segment_length.is_finite() {
        return Err(ConflateError::InvalidConfig(
            "max_segment_length must be finite and positive",
        ));
    }
    if !(config.buffer_tolerance > 0.0) || !config.buffer_tolerance.is_finite() {
        return Err(ConflateError::InvalidConfig(
            "buffer_tolerance must be finite and positive",
        ));
    }
    if !config.angle_threshold_deg.is_finite() {
        return Err(ConflateError::InvalidConfig(
            "angle_threshold_deg must be finite",
        ));
    }
    Ok(())
}

/// Explode input geometries into `LineString` fragments grouped by exact
/// attribute key, recording per-item failures. Groups come back sorted by
/// key and fragments keep input order, so downstream numbering is stable.
fn explode_into_groups(
    detailed: &[DetailedLine],
    skipped: &mut Vec<SkippedLine>,
) -> Vec<(AttrKey, Vec<LineString<f64>>)> {
    let mut by_key: AHashMap<AttrKey, Vec<LineString<f64>>> = AHashMap::new();

    'lines: for (index, line) in detailed.iter().enumerate() {
        let fragments: Vec<&LineString<f64>> = match &line.geometry {
            Geometry::LineString(ls) => vec![ls],
            Geometry::MultiLineString(mls) => mls.0.iter().collect(),
            other => {
                skipped.push(SkippedLine {
                    stage: SkipStage::Input,
                    index: index as u64,
                    reason: ConflateError::UnsupportedGeometryType(geometry_kind(other)),
                });
                continue;
            }
        };
        if fragments.is_empty() {
            skipped.push(SkippedLine {
                stage: SkipStage::Input,
                index: index as u64,
                reason: ConflateError::DegenerateGeometry(format!(
                    "input line {index} is an empty MultiLineString"
                )),
            });
            continue;
        }
        for fragment in &fragments {
            if fragment.0.len() < 2 {
                skipped.push(SkippedLine {
                    stage: SkipStage::Input,
                    index: index as u64,
                    reason: ConflateError::DegenerateGeometry(format!(
                        "input line {index} has a part with {} coordinate(s)",
                        fragment.0.len()
                    )),
                });
                continue 'lines;
            }
        }
        let entry = by_key.entry(line.attr_key()).or_default();
        entry.extend(fragments.into_iter().cloned());
    }

    let mut groups: Vec<(AttrKey, Vec<LineString<f64>>)> = by_key.into_iter().collect();
    groups.sort_by_key(|(key, _)| *key);
    groups
}
