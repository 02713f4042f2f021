use serde::{Deserialize, Serialize};

/// How detailed units are matched against a reference edge's buffer.
///
/// Only full containment is supported: a unit counts for an edge when its
/// whole geometry lies inside the buffer polygon. Intersection-based
/// matching is deliberately out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainmentMode {
    #[default]
    Full,
}

/// Tuning parameters for the conflation pipeline.
///
/// All distances are in the units of the (projected, length-preserving)
/// coordinate system of the input geometries. No geographic correction is
/// applied anywhere in the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflateConfig {
    /// Turning angle (degrees) above which a polyline is split into
    /// separate matchable segments.
    pub angle_threshold_deg: f64,
    /// Maximum length of a matchable segment; longer smooth runs are cut
    /// into pieces of exactly this length plus a remainder.
    pub max_segment_length: f64,
    /// Buffer distance around each reference edge used for containment
    /// matching.
    pub buffer_tolerance: f64,
    pub containment_mode: ContainmentMode,
}

impl Default for ConflateConfig {
    fn default() -> Self {
        Self {
            angle_threshold_deg: 30.0,
            max_segment_length: 100.0,
            buffer_tolerance: 30.0,
            containment_mode: ContainmentMode::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roundtrips_through_serde() {
        let config = ConflateConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ConflateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: ConflateConfig =
            serde_json::from_str(r#"{"buffer_tolerance": 12.5}"#).unwrap();
        assert_eq!(parsed.buffer_tolerance, 12.5);
        assert_eq!(parsed.angle_threshold_deg, 30.0);
        assert_eq!(parsed.containment_mode, ContainmentMode::Full);
    }
}
