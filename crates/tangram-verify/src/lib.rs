//! Geometric piece-verification engine for tangram-style puzzles.
//!
//! Given the template outlines of the active puzzle and the candidate
//! outlines a vision detector produced for the current frame, this crate
//! decides which detected piece corresponds to which template piece, scores
//! each correspondence (overlap, rotation error, position error), and
//! estimates one rigid correction that would align the whole detected
//! arrangement with the template.
//!
//! Every entry point is a pure function of its inputs: calls are
//! independently reproducible, nothing persists between frames, and
//! candidate indices are only meaningful within a single call.
//!
//! ## Quickstart
//!
//! ```
//! use nalgebra::Point2;
//! use tangram_verify::{
//!     verify_frame, CandidatePolygon, PieceKind, Polygon, TargetPiece, VerifyParams,
//! };
//!
//! let square = Polygon::new(vec![
//!     Point2::new(-20.0, -20.0),
//!     Point2::new(20.0, -20.0),
//!     Point2::new(20.0, 20.0),
//!     Point2::new(-20.0, 20.0),
//! ]);
//! let targets = [TargetPiece {
//!     id: "sq".into(),
//!     kind: PieceKind::Square,
//!     polygon: square.clone(),
//! }];
//! let candidates = [CandidatePolygon {
//!     kind: PieceKind::Square,
//!     polygon: square,
//! }];
//!
//! let frame = verify_frame(&targets, &candidates, &VerifyParams::default()).unwrap();
//! assert_eq!(frame.result.matched_count(), 1);
//! ```
//!
//! ## API map
//! - [`verify_matches`]: the match engine (rotation sweep + greedy
//!   assignment) over pre-grouped candidates.
//! - [`compute_global_snap`]: one rigid correction from the accepted
//!   matches.
//! - [`verify_frame`]: the per-frame facade combining both.
//! - `tangram_verify::geom` (the `tangram-verify-core` crate): polygon
//!   primitives, clipping, and IoU.

pub use tangram_verify_core as geom;

mod frame;
mod snap;
mod types;
mod verify;

pub use frame::{group_candidates, verify_frame, FrameVerification, VerifyError};
pub use snap::{circular_mean_rad, compute_global_snap, GlobalSnapTransform};
pub use types::{
    CandidatePolygon, MatchMetrics, MatchResult, PieceKind, TargetPiece, VerificationResult,
    VerifyParams,
};
pub use verify::verify_matches;

pub use tangram_verify_core::{intersect, iou, Polygon};
