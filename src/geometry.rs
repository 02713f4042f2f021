//! Planar geometry helpers shared by the conflation stages.
//!
//! Everything here operates on coordinates in a projected,
//! length-preserving CRS. Lengths and distances are plain Euclidean.

use crate::error::ConflateError;
use geo::{Coord, Geometry};

/// Euclidean distance between two coordinates.
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Total Euclidean length of a coordinate sequence.
pub fn coords_length(coords: &[Coord<f64>]) -> f64 {
    let mut len = 0.0;
    for pair in coords.windows(2) {
        len += distance(pair[0], pair[1]);
    }
    len
}

/// Direction vector from the first to the second coordinate of a line.
///
/// For a `MultiLineString` the first part is used. Fails with
/// `DegenerateGeometry` when fewer than 2 coordinates are available and with
/// `UnsupportedGeometryType` for non-line geometries.
pub fn vector_of(geom: &Geometry<f64>) -> Result<[f64; 2], ConflateError> {
    let coords: &[Coord<f64>] = match geom {
        Geometry::LineString(ls) => &ls.0,
        Geometry::MultiLineString(mls) => match mls.0.first() {
            Some(first) => &first.0,
            None => {
                return Err(ConflateError::DegenerateGeometry(
                    "empty MultiLineString".into(),
                ));
            }
        },
        other => return Err(ConflateError::UnsupportedGeometryType(geometry_kind(other))),
    };
    if coords.len() < 2 {
        return Err(ConflateError::DegenerateGeometry(format!(
            "line with {} coordinate(s), need at least 2",
            coords.len()
        )));
    }
    Ok([coords[1].x - coords[0].x, coords[1].y - coords[0].y])
}

/// Unsigned angle in degrees, in [0, 180], between two direction vectors.
///
/// Fails with `ZeroMagnitude` when either vector has zero length; callers
/// must guard against coincident points before calling.
pub fn angle_between(v1: [f64; 2], v2: [f64; 2]) -> Result<f64, ConflateError> {
    let mag1 = (v1[0] * v1[0] + v1[1] * v1[1]).sqrt();
    let mag2 = (v2[0] * v2[0] + v2[1] * v2[1]).sqrt();
    if mag1 == 0.0 || mag2 == 0.0 {
        return Err(ConflateError::ZeroMagnitude);
    }
    let dot = v1[0] * v2[0] + v1[1] * v2[1];
    // Rounding can push the cosine marginally outside [-1, 1].
    let cos = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Drop consecutive duplicate coordinates (exact equality).
pub fn dedup_coords(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for &c in coords {
        if out.last() != Some(&c) {
            out.push(c);
        }
    }
    out
}

/// Cut a coordinate sequence at `dist` from its start via linear
/// interpolation.
///
/// Returns `(head, tail)` where `head` is exactly `dist` long and `tail`
/// starts at the cut point and carries the remaining vertices. The caller
/// must ensure `0 < dist < total length`.
pub fn cut_at_distance(
    coords: &[Coord<f64>],
    dist: f64,
) -> (Vec<Coord<f64>>, Vec<Coord<f64>>) {
    let mut walked = 0.0;
    for i in 0..coords.len() - 1 {
        let seg_len = distance(coords[i], coords[i + 1]);
        if walked + seg_len >= dist {
            let t = if seg_len > 0.0 {
                (dist - walked) / seg_len
            } else {
                0.0
            };
            // A cut landing exactly on a vertex reuses that vertex instead
            // of emitting it twice in the tail.
            let (cut, rest_from) = if t >= 1.0 {
                (coords[i + 1], i + 2)
            } else {
                (
                    Coord {
                        x: coords[i].x + (coords[i + 1].x - coords[i].x) * t,
                        y: coords[i].y + (coords[i + 1].y - coords[i].y) * t,
                    },
                    i + 1,
                )
            };
            let mut head = coords[..=i].to_vec();
            head.push(cut);
            let mut tail = vec![cut];
            if rest_from < coords.len() {
                tail.extend_from_slice(&coords[rest_from..]);
            }
            return (head, tail);
        }
        walked += seg_len;
    }
    // dist >= total length; nothing left to cut.
    (coords.to_vec(), Vec::new())
}

/// Human-readable kind name for error reporting.
pub fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    #[test]
    fn angle_between_perpendicular() {
        let angle = angle_between([1.0, 0.0], [0.0, 1.0]).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn angle_between_opposite() {
        let angle = angle_between([1.0, 0.0], [-2.0, 0.0]).unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn angle_between_zero_vector_fails() {
        assert_eq!(
            angle_between([0.0, 0.0], [1.0, 0.0]),
            Err(ConflateError::ZeroMagnitude)
        );
    }

    #[test]
    fn vector_of_uses_first_two_coords() {
        let ls = LineString::from(vec![(0.0, 0.0), (3.0, 4.0), (10.0, 10.0)]);
        let v = vector_of(&Geometry::LineString(ls)).unwrap();
        assert_eq!(v, [3.0, 4.0]);
    }

    #[test]
    fn vector_of_single_coord_fails() {
        let ls = LineString::from(vec![(0.0, 0.0)]);
        let err = vector_of(&Geometry::LineString(ls)).unwrap_err();
        assert!(matches!(err, ConflateError::DegenerateGeometry(_)));
    }

    #[test]
    fn cut_conserves_length() {
        let coords: Vec<Coord<f64>> = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 4.0, y: 0.0 },
            Coord { x: 4.0, y: 4.0 },
        ];
        let total = coords_length(&coords);
        let (head, tail) = cut_at_distance(&coords, 5.0);
        assert!((coords_length(&head) - 5.0).abs() < 1e-12);
        assert!((coords_length(&head) + coords_length(&tail) - total).abs() < 1e-12);
        // Cut lands 1.0 up the vertical segment.
        assert_eq!(*head.last().unwrap(), Coord { x: 4.0, y: 1.0 });
        assert_eq!(tail[0], Coord { x: 4.0, y: 1.0 });
    }

    #[test]
    fn cut_landing_on_vertex_does_not_duplicate_it() {
        let coords: Vec<Coord<f64>> = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 4.0, y: 0.0 },
            Coord { x: 4.0, y: 4.0 },
        ];
        let (head, tail) = cut_at_distance(&coords, 4.0);
        assert_eq!(
            head,
            vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 4.0, y: 0.0 }]
        );
        assert_eq!(
            tail,
            vec![Coord { x: 4.0, y: 0.0 }, Coord { x: 4.0, y: 4.0 }]
        );
    }

    #[test]
    fn dedup_drops_exact_repeats_only() {
        let coords = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 0.0, y: 0.0 },
        ];
        let deduped = dedup_coords(&coords);
        assert_eq!(deduped.len(), 3);
    }
}
