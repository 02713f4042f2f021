//! Conflation of a detailed, densely attributed line network onto a
//! topologically simplified reference network.
//!
//! The pipeline merges directly-connected detailed fragments that share
//! attributes, splits the merged lines at direction discontinuities and a
//! length cap, matches the resulting units into per-reference-edge buffers
//! by full containment, and aggregates matched values with duplicate-origin
//! and secondary-key dedup policies. Orphaned units and total attribute
//! mass (value x length) are reported alongside the aggregation.
//!
//! All geometry is assumed to be in one fixed projected, length-preserving
//! coordinate system; reading files, CRS transforms and rendering are the
//! caller's concern. Entry point: [`pipeline::conflate`].

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::let_and_return,
    clippy::cmp_owned,
    clippy::op_ref
)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod geometry;
pub mod mass;
pub mod matcher;
pub mod merge;
pub mod orphans;
pub mod pipeline;
pub mod segment;
pub mod types;

pub use config::{ConflateConfig, ContainmentMode};
pub use error::ConflateError;
pub use pipeline::conflate;
pub use types::{
    AggregatedEdge, ConflationOutput, DetailedLine, DetailedUnit, MassReport, OrphanReport,
    SkipStage, SkippedLine,
};
