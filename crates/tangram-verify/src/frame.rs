//! End-to-end per-frame helper.
//!
//! `verify_frame` takes the raw collaborator outputs (template targets and
//! this frame's classified candidate outlines), groups candidates by kind,
//! runs the match engine, and derives the global snap correction from the
//! accepted matches. Lower-level callers that already maintain their own
//! kind grouping or centroid caches can call `verify_matches` and
//! `compute_global_snap` directly.

use std::collections::HashMap;

use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::snap::{compute_global_snap, GlobalSnapTransform};
use crate::types::{CandidatePolygon, PieceKind, TargetPiece, VerificationResult, VerifyParams};
use crate::verify::verify_matches;

/// Errors produced by the frame-level helpers. The per-frame verification
/// path itself is total; only malformed configuration is reported.
#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    #[error("rotation sweep step must be positive (got {step_deg})")]
    InvalidRotationStep { step_deg: f32 },
    #[error("max rotation must be non-negative (got {max_deg})")]
    InvalidMaxRotation { max_deg: f32 },
}

/// Everything one evaluation produces: per-target verdicts plus the optional
/// arrangement-level correction.
#[derive(Clone, Debug)]
pub struct FrameVerification {
    pub result: VerificationResult,
    pub snap: Option<GlobalSnapTransform>,
}

/// Group candidates by kind, preserving input order within each kind.
///
/// `matched_index` values in a [`VerificationResult`] refer to positions in
/// these per-kind lists.
pub fn group_candidates(
    candidates: &[CandidatePolygon],
) -> HashMap<PieceKind, Vec<CandidatePolygon>> {
    let mut map: HashMap<PieceKind, Vec<CandidatePolygon>> = HashMap::new();
    for c in candidates {
        map.entry(c.kind).or_default().push(c.clone());
    }
    map
}

/// Verify one frame end to end.
///
/// Validates `params`, then runs matching and snap estimation. The result
/// covers every target; `snap` is `None` when nothing matched.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(targets = targets.len(), candidates = candidates.len()))
)]
pub fn verify_frame(
    targets: &[TargetPiece],
    candidates: &[CandidatePolygon],
    params: &VerifyParams,
) -> Result<FrameVerification, VerifyError> {
    params.validate()?;

    let candidates_by_kind = group_candidates(candidates);
    let result = verify_matches(targets, &candidates_by_kind, params);

    let target_centroids: HashMap<String, Point2<f32>> = targets
        .iter()
        .map(|t| (t.id.clone(), t.polygon.centroid()))
        .collect();
    let candidate_centroids: HashMap<PieceKind, Vec<Point2<f32>>> = candidates_by_kind
        .iter()
        .map(|(kind, cands)| {
            (
                *kind,
                cands.iter().map(|c| c.polygon.centroid()).collect(),
            )
        })
        .collect();

    let snap = compute_global_snap(
        &result,
        &target_centroids,
        &candidate_centroids,
        params.max_rotation_deg,
    );

    Ok(FrameVerification { result, snap })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangram_verify_core::Polygon;

    #[test]
    fn invalid_params_are_rejected_up_front() {
        let params = VerifyParams {
            rotation_step_deg: -1.0,
            ..VerifyParams::default()
        };
        let err = verify_frame(&[], &[], &params).unwrap_err();
        assert!(matches!(err, VerifyError::InvalidRotationStep { .. }));
    }

    #[test]
    fn empty_frame_verifies_trivially() {
        let frame = verify_frame(&[], &[], &VerifyParams::default()).expect("frame");
        assert!(frame.result.results.is_empty());
        assert!(frame.snap.is_none());
    }

    #[test]
    fn grouping_preserves_input_order_within_kind() {
        let square = |x: f32| {
            Polygon::new(vec![
                Point2::new(x, 0.0),
                Point2::new(x + 1.0, 0.0),
                Point2::new(x + 1.0, 1.0),
                Point2::new(x, 1.0),
            ])
        };
        let candidates = vec![
            CandidatePolygon {
                kind: PieceKind::Square,
                polygon: square(0.0),
            },
            CandidatePolygon {
                kind: PieceKind::SmallTriangle,
                polygon: square(5.0),
            },
            CandidatePolygon {
                kind: PieceKind::Square,
                polygon: square(10.0),
            },
        ];

        let grouped = group_candidates(&candidates);
        let squares = grouped.get(&PieceKind::Square).unwrap();
        assert_eq!(squares.len(), 2);
        assert_eq!(squares[0].polygon.vertices[0].x, 0.0);
        assert_eq!(squares[1].polygon.vertices[0].x, 10.0);
    }
}
