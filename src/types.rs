//! Data model for the conflation pipeline.

use crate::error::ConflateError;
use crate::geometry::coords_length;
use geo::{Geometry, LineString};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::BTreeSet;

/// Key used to group detailed fragments before connectivity merging.
///
/// Fragments merge only when both attributes match exactly, mirroring how
/// the detailed source encodes one road as many identically-attributed
/// pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrKey {
    pub primary: OrderedFloat<f64>,
    pub secondary: OrderedFloat<f64>,
}

/// One attributed line of the detailed input network.
///
/// `LineString` and `MultiLineString` geometries are accepted; any other
/// kind is reported as a per-item `UnsupportedGeometryType` failure.
#[derive(Debug, Clone)]
pub struct DetailedLine {
    pub geometry: Geometry<f64>,
    /// The value being conflated onto the reference network
    /// (e.g. modelled cyclist flow per segment).
    pub primary_value: f64,
    /// Secondary attribute used to collapse parallel duplicate
    /// representations (e.g. a quietness score).
    pub secondary_key: OrderedFloat<f64>,
}

impl DetailedLine {
    pub fn new(
        geometry: Geometry<f64>,
        primary_value: f64,
        secondary_key: f64,
    ) -> Self {
        Self {
            geometry,
            primary_value,
            secondary_key: OrderedFloat(secondary_key),
        }
    }

    pub fn attr_key(&self) -> AttrKey {
        AttrKey {
            primary: OrderedFloat(self.primary_value),
            secondary: self.secondary_key,
        }
    }
}

/// A maximal chain of directly-connected fragments, pre-segmentation.
/// `origin_id` is its index in the deterministic merge output order and is
/// inherited by every segment cut from it.
#[derive(Debug, Clone)]
pub struct MergedLine {
    pub origin_id: u64,
    pub geometry: LineString<f64>,
    pub primary_value: f64,
    pub secondary_key: OrderedFloat<f64>,
}

/// One matchable unit produced by the angle segmenter. Immutable once built.
#[derive(Debug, Clone)]
pub struct DetailedUnit {
    pub id: u64,
    pub geometry: LineString<f64>,
    pub primary_value: f64,
    pub secondary_key: OrderedFloat<f64>,
    /// Index of the pre-split merged line this unit descended from.
    pub origin_id: u64,
}

impl DetailedUnit {
    pub fn length(&self) -> f64 {
        coords_length(&self.geometry.0)
    }

    /// Attribute mass of this unit: value times length.
    pub fn mass(&self) -> f64 {
        self.primary_value * self.length()
    }
}

/// A reference edge with its aggregation result.
#[derive(Debug, Clone)]
pub struct AggregatedEdge {
    pub id: u64,
    pub geometry: LineString<f64>,
    /// Sum of the per-group length-weighted contributions of the units this
    /// edge claimed. 0.0 when nothing matched (a legitimate "no coverage"
    /// result, not an error).
    pub aggregated_value: f64,
    /// Unit ids claimed by this edge, ascending. Disjoint across edges.
    pub claimed_unit_ids: Vec<u64>,
}

impl AggregatedEdge {
    pub fn length(&self) -> f64 {
        coords_length(&self.geometry.0)
    }
}

/// Units never claimed by any reference edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanReport {
    pub unit_ids: BTreeSet<u64>,
    /// Σ value × length over the orphaned units.
    pub total_mass: f64,
}

/// Attribute mass before and after conflation. Reported, not enforced:
/// orphan mass and the weighting policy legitimately open a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassReport {
    pub input_mass: f64,
    pub output_mass: f64,
}

impl MassReport {
    pub fn gap(&self) -> f64 {
        self.input_mass - self.output_mass
    }
}

/// Stage at which an input line was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipStage {
    /// Rejected while validating/exploding the raw input; `index` is the
    /// position in the detailed input slice.
    Input,
    /// Rejected by the angle segmenter; `index` is the merged line's
    /// origin id.
    Segmentation,
}

/// A single input line that could not be processed. One malformed line does
/// not block conflation of the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub stage: SkipStage,
    pub index: u64,
    pub reason: ConflateError,
}

/// Full result of a pipeline run.
#[derive(Debug, Clone)]
pub struct ConflationOutput {
    /// One entry per reference edge, ascending id.
    pub edges: Vec<AggregatedEdge>,
    pub orphans: OrphanReport,
    pub mass: MassReport,
    pub skipped: Vec<SkippedLine>,
}
