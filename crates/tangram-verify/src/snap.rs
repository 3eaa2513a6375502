//! Global snap estimation.
//!
//! A single rigid correction for the whole arrangement models the common
//! failure mode where every physical piece is consistently offset or rotated
//! against the template (camera-pose drift, calibration slack). The caller
//! nudges the displayed template once instead of correcting each piece.

use std::collections::HashMap;

use log::debug;
use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::types::{MatchResult, PieceKind, VerificationResult};

/// One rigid correction (rotation then translation) aligning the template
/// onto the detected arrangement.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GlobalSnapTransform {
    pub translation: Vector2<f32>,
    pub rotation_rad: f32,
}

impl GlobalSnapTransform {
    /// Apply the correction to a template-space point.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        Rotation2::new(self.rotation_rad) * p + self.translation
    }
}

/// Circular mean of angles in radians, via sin/cos accumulation and atan2.
///
/// Arithmetic averaging breaks at the ±180° boundary (+179° and -179° would
/// average to 0°); the circular mean lands near ±180° instead. Returns
/// `None` for an empty input.
pub fn circular_mean_rad(angles: &[f32]) -> Option<f32> {
    if angles.is_empty() {
        return None;
    }
    let mut sin_sum = 0.0_f64;
    let mut cos_sum = 0.0_f64;
    for &a in angles {
        sin_sum += (a as f64).sin();
        cos_sum += (a as f64).cos();
    }
    Some(sin_sum.atan2(cos_sum) as f32)
}

/// Aggregate the accepted matches into one rigid correction.
///
/// Centroids are passed explicitly rather than read out of the match engine
/// so the estimator has no hidden coupling to its internals; the caller
/// typically reuses the centroids it already computed while matching.
/// Returns `None` when zero targets matched, which the caller must treat as
/// "apply no correction".
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
pub fn compute_global_snap(
    result: &VerificationResult,
    target_centroids: &HashMap<String, Point2<f32>>,
    candidate_centroids: &HashMap<PieceKind, Vec<Point2<f32>>>,
    max_rotation_deg: f32,
) -> Option<GlobalSnapTransform> {
    let mut pairs: Vec<(Point2<f32>, Point2<f32>)> = Vec::new();
    let mut deltas_rad: Vec<f32> = Vec::new();

    // Accumulate in target-id order: map iteration order varies run to run
    // and would wiggle the float sums, breaking reproducibility of equal
    // inputs.
    let mut matched: Vec<&MatchResult> = result.results.values().collect();
    matched.sort_by(|a, b| a.target_id.cmp(&b.target_id));

    for r in matched {
        let (Some(index), Some(metrics)) = (r.matched_index, r.metrics) else {
            continue;
        };
        let Some(&target_c) = target_centroids.get(&r.target_id) else {
            continue;
        };
        let Some(&candidate_c) = candidate_centroids.get(&r.kind).and_then(|v| v.get(index))
        else {
            continue;
        };
        pairs.push((target_c, candidate_c));
        deltas_rad.push(metrics.rotation_delta_deg.to_radians());
    }

    if pairs.is_empty() {
        return None;
    }

    let max_rad = max_rotation_deg.to_radians();
    let rotation_rad = circular_mean_rad(&deltas_rad)?.clamp(-max_rad, max_rad);

    // Translation that best aligns the rotated target centroids onto their
    // candidates, in the mean (least-squares-like) sense.
    let rot = Rotation2::new(rotation_rad);
    let mut sum = Vector2::zeros();
    for (target_c, candidate_c) in &pairs {
        sum += candidate_c - rot * target_c;
    }
    let translation = sum / pairs.len() as f32;

    debug!(
        "global snap from {} pairs: rot {:.2} deg, t ({:.1}, {:.1})",
        pairs.len(),
        rotation_rad.to_degrees(),
        translation.x,
        translation.y
    );

    Some(GlobalSnapTransform {
        translation,
        rotation_rad,
    })
}
