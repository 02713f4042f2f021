use thiserror::Error;

/// Error kinds for the conflation pipeline.
///
/// Geometry-level errors (`DegenerateGeometry`, `ZeroMagnitude`,
/// `UnsupportedGeometryType`) are local to a single input line and are
/// collected into [`crate::types::SkippedLine`] entries rather than aborting
/// the run. `EmptyInput`, `InvalidConfig` and a degenerate reference edge
/// during index build are fatal for the whole pipeline call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConflateError {
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("zero-magnitude vector in angle computation")]
    ZeroMagnitude,

    #[error("unsupported geometry type: {0}, expected LineString or MultiLineString")]
    UnsupportedGeometryType(&'static str),

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
