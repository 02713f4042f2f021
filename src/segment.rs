//! Angle segmenter: splits polylines at direction discontinuities and caps
//! segment length, producing the matchable units fed to the buffer matcher.

use crate::config::ConflateConfig;
use crate::error::ConflateError;
use crate::geometry::{coords_length, cut_at_distance, dedup_coords, geometry_kind};
use geo::{Coord, Geometry, LineString};

/// Relative slack when comparing a segment's length against the cap.
/// A piece cut to exactly `max_length` must not be re-cut on a second pass,
/// so lengths within f64 noise of the cap count as within it.
const LENGTH_SLACK_REL: f64 = 1e-9;

/// Split a geometry into smooth, bounded-length segments.
///
/// `LineString`s are split directly; each part of a `MultiLineString` is
/// processed independently. Any other geometry kind is an
/// `UnsupportedGeometryType` error, and a line that collapses to fewer than
/// two distinct coordinates is `DegenerateGeometry`. Both are per-item
/// failures from the pipeline's point of view.
pub fn segment_geometry(
    geom: &Geometry<f64>,
    config: &ConflateConfig,
) -> Result<Vec<LineString<f64>>, ConflateError> {
    match geom {
        Geometry::LineString(ls) => split_linestring(ls, config),
        Geometry::MultiLineString(mls) => {
            let mut out = Vec::new();
            for part in &mls.0 {
                out.extend(split_linestring(part, config)?);
            }
            Ok(out)
        }
        other => Err(ConflateError::UnsupportedGeometryType(geometry_kind(other))),
    }
}

/// Split one polyline at turning angles above the threshold, then cap each
/// smooth run at `max_segment_length`.
///
/// A 2-coordinate polyline has no interior turning angle and passes through
/// unsplit, subject only to length capping.
pub fn split_linestring(
    line: &LineString<f64>,
    config: &ConflateConfig,
) -> Result<Vec<LineString<f64>>, ConflateError> {
    // The capping loop below only terminates for a finite, positive cap.
    if !(config.max_segment_length > 0.0) || !config.max_segment_length.is_finite() {
        return Err(ConflateError::InvalidConfig(
            "max_segment_length must be finite and positive",
        ));
    }
    let coords = dedup_coords(&line.0);
    if coords.len() < 2 {
        return Err(ConflateError::DegenerateGeometry(format!(
            "line has {} distinct coordinate(s) after deduplication",
            coords.len()
        )));
    }

    // Direction of each consecutive coordinate pair. Duplicates are gone,
    // so every segment has a well-defined direction.
    let directions: Vec<f64> = coords
        .windows(2)
        .map(|p| (p[1].y - p[0].y).atan2(p[1].x - p[0].x))
        .collect();

    // Vertex indices where the turning angle exceeds the threshold.
    let mut split_indices = Vec::new();
    for i in 0..directions.len() - 1 {
        if turning_angle_deg(directions[i], directions[i + 1]) > config.angle_threshold_deg {
            split_indices.push(i + 1);
        }
    }

    let mut segments = Vec::new();
    let mut last = 0;
    for idx in split_indices {
        cap_length(
            coords[last..=idx].to_vec(),
            config.max_segment_length,
            &mut segments,
        );
        last = idx;
    }
    cap_length(
        coords[last..].to_vec(),
        config.max_segment_length,
        &mut segments,
    );

    Ok(segments)
}

/// Absolute turning angle in degrees, normalized into [0, 180].
///
/// The raw atan2 difference can wrap across ±180°; a near-straight
/// continuation there must read as a small turn, not ~360°.
fn turning_angle_deg(dir_a: f64, dir_b: f64) -> f64 {
    let diff = (dir_b - dir_a).to_degrees().abs() % 360.0;
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Cut a leading piece of exactly `max_length` off the run until the
/// remainder fits, pushing each piece onto `out`.
fn cap_length(mut coords: Vec<Coord<f64>>, max_length: f64, out: &mut Vec<LineString<f64>>) {
    loop {
        let len = coords_length(&coords);
        if len <= max_length * (1.0 + LENGTH_SLACK_REL) {
            out.push(LineString::new(coords));
            return;
        }
        let (head, tail) = cut_at_distance(&coords, max_length);
        out.push(LineString::new(head));
        coords = tail;
    }
}
