//! Buffer index: a tolerance buffer polygon around each reference edge and
//! an R-tree over the buffer envelopes for candidate lookup.

use crate::error::ConflateError;
use crate::geometry::dedup_coords;
use geo::{BooleanOps, BoundingRect, Contains, Coord, LineString, MultiPolygon, Polygon};
use rayon::prelude::*;
use rstar::{AABB, RTree, RTreeObject};
use std::f64::consts::{FRAC_PI_2, PI};

/// Chords per semicircular cap when approximating the buffer outline
/// (8 per quarter arc, shapely's default fidelity).
const ARC_STEPS: usize = 16;

/// A reference edge with its immutable buffer polygon. Owned by the
/// [`BufferIndex`]; rebuilding the index is required if reference geometry
/// changes.
#[derive(Debug, Clone)]
pub struct BufferedEdge {
    pub id: u64,
    pub geometry: LineString<f64>,
    pub buffer: MultiPolygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl BufferedEdge {
    pub fn build(
        id: u64,
        geometry: LineString<f64>,
        tolerance: f64,
    ) -> Result<Self, ConflateError> {
        let buffer = buffer_polyline(&geometry, tolerance)?;
        let rect = buffer.bounding_rect().ok_or_else(|| {
            ConflateError::DegenerateGeometry(format!("empty buffer for reference edge {id}"))
        })?;
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        Ok(Self {
            id,
            geometry,
            buffer,
            envelope,
        })
    }

    /// Full containment test: the whole unit geometry must lie inside the
    /// buffer, mere intersection does not count.
    pub fn contains(&self, line: &LineString<f64>) -> bool {
        self.buffer.contains(line)
    }
}

impl RTreeObject for BufferedEdge {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Buffer a polyline at a fixed distance: the union of one capsule
/// (rectangle with semicircular caps) per consecutive coordinate pair.
pub fn buffer_polyline(
    line: &LineString<f64>,
    tolerance: f64,
) -> Result<MultiPolygon<f64>, ConflateError> {
    let coords = dedup_coords(&line.0);
    if coords.len() < 2 {
        return Err(ConflateError::DegenerateGeometry(format!(
            "reference edge has {} distinct coordinate(s), cannot buffer",
            coords.len()
        )));
    }

    let mut acc: Option<MultiPolygon<f64>> = None;
    for pair in coords.windows(2) {
        let cap = MultiPolygon(vec![capsule(pair[0], pair[1], tolerance)]);
        acc = Some(match acc {
            Some(so_far) => so_far.union(&cap),
            None => cap,
        });
    }
    // coords.len() >= 2 guarantees at least one capsule.
    Ok(acc.expect("at least one segment"))
}

/// Capsule around the segment p1 -> p2: semicircle around p2, semicircle
/// around p1, joined by the offset sides. Ring is counter-clockwise.
fn capsule(p1: Coord<f64>, p2: Coord<f64>, radius: f64) -> Polygon<f64> {
    let theta = (p2.y - p1.y).atan2(p2.x - p1.x);
    let mut ring = Vec::with_capacity(2 * (ARC_STEPS + 1));
    for i in 0..=ARC_STEPS {
        let a = theta - FRAC_PI_2 + PI * (i as f64 / ARC_STEPS as f64);
        ring.push(Coord {
            x: p2.x + radius * a.cos(),
            y: p2.y + radius * a.sin(),
        });
    }
    for i in 0..=ARC_STEPS {
        let a = theta + FRAC_PI_2 + PI * (i as f64 / ARC_STEPS as f64);
        ring.push(Coord {
            x: p1.x + radius * a.cos(),
            y: p1.y + radius * a.sin(),
        });
    }
    Polygon::new(LineString::new(ring), vec![])
}

/// Read-only spatial index over reference-edge buffers.
#[derive(Debug)]
pub struct BufferIndex {
    tree: RTree<BufferedEdge>,
}

impl BufferIndex {
    /// Buffer every reference edge and bulk-load the R-tree. Buffer
    /// construction is independent per edge and runs in parallel; any
    /// degenerate reference edge fails the whole build.
    pub fn build(
        reference: &[(u64, LineString<f64>)],
        tolerance: f64,
    ) -> Result<Self, ConflateError> {
        if reference.is_empty() {
            return Err(ConflateError::EmptyInput("no reference edges supplied"));
        }
        let edges: Vec<BufferedEdge> = reference
            .par_iter()
            .map(|(id, geometry)| BufferedEdge::build(*id, geometry.clone(), tolerance))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            tree: RTree::bulk_load(edges),
        })
    }

    /// Edges whose buffer bounding box intersects the given geometry's
    /// bounding box. Exact containment is the caller's follow-up check.
    pub fn candidates(&self, line: &LineString<f64>) -> Vec<&BufferedEdge> {
        let Some(rect) = line.bounding_rect() else {
            return Vec::new();
        };
        let query = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        self.tree.locate_in_envelope_intersecting(&query).collect()
    }

    /// All edges in ascending id order, the canonical processing order of
    /// the aggregation pass.
    pub fn edges_ascending(&self) -> Vec<&BufferedEdge> {
        let mut edges: Vec<&BufferedEdge> = self.tree.iter().collect();
        edges.sort_by_key(|e| e.id);
        edges
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
