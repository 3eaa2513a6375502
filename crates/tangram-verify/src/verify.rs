//! Target-to-candidate matching.
//!
//! For each target outline the engine sweeps a bounded rotation range to
//! find the best rigid alignment onto every same-kind candidate, ranks the
//! candidates, and resolves cross-target conflicts with a greedy priority
//! pass so no candidate is claimed twice. The assignment is a heuristic,
//! priority-ordered greedy matching, not a Hungarian-style optimum; callers
//! depend on the tie-break order, so do not swap in an optimal solver
//! without flagging the behavior change.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use tangram_verify_core::{iou, Polygon};

use crate::types::{
    CandidatePolygon, MatchMetrics, MatchResult, PieceKind, TargetPiece, VerificationResult,
    VerifyParams,
};

/// One scored `(target, candidate)` pairing at its best sweep angle.
#[derive(Clone, Copy, Debug)]
struct ScoredCandidate {
    index: usize,
    metrics: MatchMetrics,
}

/// Sweep angles covering `[-max_deg, +max_deg]` in `step_deg` increments,
/// built symmetrically out from zero. Zero and both endpoints are always
/// sampled, even when the step does not divide the range evenly: an
/// unrotated piece must be able to score a perfect overlap at exactly 0°.
fn sweep_angles(max_deg: f32, step_deg: f32) -> Vec<f32> {
    if max_deg <= 0.0 {
        return vec![0.0];
    }
    // NaN or non-positive steps collapse to a coarse but finite sweep.
    let step = if step_deg > 0.0 { step_deg } else { max_deg };

    let mut half = Vec::new();
    let mut a = step;
    while a < max_deg - 1e-4 {
        half.push(a);
        a += step;
    }

    let mut angles = Vec::with_capacity(2 * half.len() + 3);
    angles.push(-max_deg);
    angles.extend(half.iter().rev().map(|a| -a));
    angles.push(0.0);
    angles.extend(half.iter().copied());
    angles.push(max_deg);
    angles
}

/// Best rigid alignment of `target` onto `candidate` over the sweep.
///
/// Each angle rotates the target about its own centroid, then translates it
/// onto the candidate centroid before scoring overlap. The centroid error is
/// the pre-translation centroid distance and is therefore the same at every
/// angle; the angle maximizing IoU wins, ties broken by smaller centroid
/// error.
fn score_pair(
    target: &Polygon,
    target_centroid: Point2<f32>,
    candidate: &Polygon,
    candidate_centroid: Point2<f32>,
    angles: &[f32],
) -> MatchMetrics {
    let centroid_error = (candidate_centroid - target_centroid).norm();
    let offset = candidate_centroid - target_centroid;

    let mut best = MatchMetrics {
        iou: -1.0,
        centroid_error,
        rotation_delta_deg: 0.0,
    };
    for &angle_deg in angles {
        let aligned = target
            .rotated_about(target_centroid, angle_deg.to_radians())
            .translated(offset);
        let overlap = iou(&aligned, candidate);
        if overlap > best.iou || (overlap == best.iou && centroid_error < best.centroid_error) {
            best = MatchMetrics {
                iou: overlap,
                centroid_error,
                rotation_delta_deg: angle_deg,
            };
        }
    }
    best
}

/// Score every same-kind candidate for one target and rank best-first:
/// IoU descending, then |rotation delta| ascending, then centroid error
/// ascending.
fn ranked_candidates(
    target: &TargetPiece,
    candidates: &[CandidatePolygon],
    angles: &[f32],
) -> Vec<ScoredCandidate> {
    let target_centroid = target.polygon.centroid();
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.polygon.is_valid())
        .map(|(index, c)| ScoredCandidate {
            index,
            metrics: score_pair(
                &target.polygon,
                target_centroid,
                &c.polygon,
                c.polygon.centroid(),
                angles,
            ),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.metrics
            .iou
            .partial_cmp(&a.metrics.iou)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.metrics
                    .rotation_delta_deg
                    .abs()
                    .partial_cmp(&b.metrics.rotation_delta_deg.abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| {
                a.metrics
                    .centroid_error
                    .partial_cmp(&b.metrics.centroid_error)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    scored
}

fn passes_thresholds(m: &MatchMetrics, params: &VerifyParams) -> bool {
    m.iou >= params.iou_threshold
        && m.rotation_delta_deg.abs() <= params.max_rotation_deg
        && m.centroid_error <= params.centroid_error_max
}

fn unmatched(target: &TargetPiece) -> MatchResult {
    MatchResult {
        target_id: target.id.clone(),
        kind: target.kind,
        matched_index: None,
        metrics: None,
    }
}

/// Decide which candidate, if any, corresponds to each target outline.
///
/// Pure function of its inputs: no state survives the call, and candidate
/// indices are only meaningful against the `candidates_by_kind` value passed
/// here. Malformed polygons (fewer than 3 vertices) make that entity
/// unmatchable rather than failing the call.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(targets = targets.len()))
)]
pub fn verify_matches(
    targets: &[TargetPiece],
    candidates_by_kind: &HashMap<PieceKind, Vec<CandidatePolygon>>,
    params: &VerifyParams,
) -> VerificationResult {
    let angles = sweep_angles(params.max_rotation_deg, params.rotation_step_deg);

    // Phase 1: score and rank candidates per target. Targets whose kind has
    // no candidates skip the sweep entirely.
    let mut ranked: Vec<(usize, Vec<ScoredCandidate>)> = Vec::with_capacity(targets.len());
    for (ti, target) in targets.iter().enumerate() {
        if !target.polygon.is_valid() {
            warn!(
                "target {} has a malformed outline ({} vertices), treating as unmatchable",
                target.id,
                target.polygon.vertices.len()
            );
            ranked.push((ti, Vec::new()));
            continue;
        }
        let options = match candidates_by_kind.get(&target.kind) {
            Some(cands) if !cands.is_empty() => ranked_candidates(target, cands, &angles),
            _ => Vec::new(),
        };
        ranked.push((ti, options));
    }

    // Phase 2: priority order. Targets whose best candidate scores a higher
    // IoU claim first; the sort is stable, so equal scores keep input order.
    ranked.sort_by(|(_, a), (_, b)| {
        let best_a = a.first().map(|s| s.metrics.iou).unwrap_or(-1.0);
        let best_b = b.first().map(|s| s.metrics.iou).unwrap_or(-1.0);
        best_b.partial_cmp(&best_a).unwrap_or(std::cmp::Ordering::Equal)
    });

    // Phase 3: greedy assignment, threading the claimed-index sets through a
    // fold so the engine holds no state between calls. A chosen candidate
    // that fails the acceptance thresholds is never claimed and stays
    // available to later targets.
    let (results, _claimed) = ranked.into_iter().fold(
        (
            HashMap::with_capacity(targets.len()),
            HashMap::<PieceKind, HashSet<usize>>::new(),
        ),
        |(mut results, mut claimed), (ti, options)| {
            let target = &targets[ti];
            let taken = claimed.entry(target.kind).or_default();

            let chosen = options.iter().find(|s| !taken.contains(&s.index));
            let verdict = match chosen {
                Some(s) if passes_thresholds(&s.metrics, params) => {
                    taken.insert(s.index);
                    MatchResult {
                        target_id: target.id.clone(),
                        kind: target.kind,
                        matched_index: Some(s.index),
                        metrics: Some(s.metrics),
                    }
                }
                Some(s) => {
                    debug!(
                        "target {} best candidate {} rejected (iou {:.3}, dc {:.1}, rot {:.1})",
                        target.id,
                        s.index,
                        s.metrics.iou,
                        s.metrics.centroid_error,
                        s.metrics.rotation_delta_deg
                    );
                    unmatched(target)
                }
                None => unmatched(target),
            };
            results.insert(verdict.target_id.clone(), verdict);
            (results, claimed)
        },
    );

    let result = VerificationResult { results };
    debug!(
        "verified {} targets, {} matched",
        targets.len(),
        result.matched_count()
    );
    result
}
