use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tangram_verify_core::Polygon;

/// Classification of a tangram piece outline.
///
/// Kinds are deliberately coarse: the two large triangles (and the two small
/// ones) are interchangeable, so they share a kind and targets are told
/// apart by [`TargetPiece::id`] instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    LargeTriangle,
    MediumTriangle,
    SmallTriangle,
    Square,
    Parallelogram,
}

/// One outline of the puzzle template.
///
/// `id` is unique per outline even when `kind` repeats (duplicate shapes).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetPiece {
    pub id: String,
    pub kind: PieceKind,
    pub polygon: Polygon,
}

/// One detected outline for the current frame, with its classified kind.
///
/// Candidates carry no identity beyond their index within their kind group
/// for a single call; index `i` in one frame has no relation to index `i`
/// in the next.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidatePolygon {
    pub kind: PieceKind,
    pub polygon: Polygon,
}

/// How well a target outline fits a candidate at its best sweep angle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Intersection-over-Union after rigid alignment, in `[0, 1]`.
    pub iou: f32,
    /// Distance between the target and candidate centroids before the
    /// aligning translation, in input length units.
    pub centroid_error: f32,
    /// Signed sweep angle that produced the best overlap, degrees.
    pub rotation_delta_deg: f32,
}

/// Verdict for a single target outline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchResult {
    pub target_id: String,
    pub kind: PieceKind,
    /// Index into the candidate list of `kind`, or `None` when no candidate
    /// of that kind exists or none cleared the acceptance thresholds.
    pub matched_index: Option<usize>,
    pub metrics: Option<MatchMetrics>,
}

/// Per-target verdicts for one evaluation, covering every input target.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VerificationResult {
    pub results: HashMap<String, MatchResult>,
}

impl VerificationResult {
    /// Ids of targets that claimed a candidate this frame.
    pub fn matched_target_ids(&self) -> Vec<&str> {
        self.results
            .values()
            .filter(|r| r.matched_index.is_some())
            .map(|r| r.target_id.as_str())
            .collect()
    }

    pub fn matched_count(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.matched_index.is_some())
            .count()
    }

    pub fn get(&self, target_id: &str) -> Option<&MatchResult> {
        self.results.get(target_id)
    }
}

/// Tunable verification settings.
///
/// The defaults are product-tuned for pixel-scale coordinates and should be
/// re-validated whenever the caller's coordinate scale changes; none of them
/// is a derived constant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VerifyParams {
    /// Half-width of the rotation sweep, degrees.
    #[serde(default = "default_max_rotation_deg")]
    pub max_rotation_deg: f32,
    /// Minimum aligned IoU to accept a match.
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
    /// Maximum centroid distance to accept a match, input length units.
    #[serde(default = "default_centroid_error_max")]
    pub centroid_error_max: f32,
    /// Sweep discretization step, degrees. Both sweep endpoints are always
    /// sampled regardless of divisibility.
    #[serde(default = "default_rotation_step_deg")]
    pub rotation_step_deg: f32,
    /// Conflict resolution strategy. Greedy priority assignment is the only
    /// supported mode; the flag is an extension point, not a live switch.
    #[serde(default = "default_true")]
    pub use_greedy_assignment: bool,
}

fn default_max_rotation_deg() -> f32 {
    15.0
}

fn default_iou_threshold() -> f32 {
    0.60
}

fn default_centroid_error_max() -> f32 {
    30.0
}

fn default_rotation_step_deg() -> f32 {
    2.0
}

fn default_true() -> bool {
    true
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            max_rotation_deg: default_max_rotation_deg(),
            iou_threshold: default_iou_threshold(),
            centroid_error_max: default_centroid_error_max(),
            rotation_step_deg: default_rotation_step_deg(),
            use_greedy_assignment: default_true(),
        }
    }
}

impl VerifyParams {
    /// Check the params for values the sweep cannot work with.
    pub fn validate(&self) -> Result<(), crate::VerifyError> {
        if !(self.rotation_step_deg > 0.0) {
            return Err(crate::VerifyError::InvalidRotationStep {
                step_deg: self.rotation_step_deg,
            });
        }
        if !(self.max_rotation_deg >= 0.0) {
            return Err(crate::VerifyError::InvalidMaxRotation {
                max_deg: self.max_rotation_deg,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_product_tuning() {
        let p = VerifyParams::default();
        assert_eq!(p.max_rotation_deg, 15.0);
        assert_eq!(p.iou_threshold, 0.60);
        assert_eq!(p.centroid_error_max, 30.0);
        assert_eq!(p.rotation_step_deg, 2.0);
        assert!(p.use_greedy_assignment);
    }

    #[test]
    fn params_deserialize_with_partial_overrides() {
        let p: VerifyParams = serde_json::from_str(r#"{"iou_threshold": 0.8}"#).unwrap();
        assert_eq!(p.iou_threshold, 0.8);
        assert_eq!(p.max_rotation_deg, 15.0);
    }

    #[test]
    fn validate_rejects_non_positive_step() {
        let p = VerifyParams {
            rotation_step_deg: 0.0,
            ..VerifyParams::default()
        };
        assert!(p.validate().is_err());

        let p = VerifyParams {
            rotation_step_deg: f32::NAN,
            ..VerifyParams::default()
        };
        assert!(p.validate().is_err());
    }
}
