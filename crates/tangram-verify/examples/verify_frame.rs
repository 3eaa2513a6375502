//! Verify one frame of detected outlines against a puzzle template.
//!
//! Usage: `cargo run --example verify_frame [input.json]`
//!
//! The input JSON holds `targets`, `candidates`, and optional `params`; with
//! no argument a built-in demo arrangement (template drifted by a few units)
//! is verified instead. The report is printed as JSON to stdout.

use std::{env, fs};

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "tracing"))]
use log::{info, warn, LevelFilter};

#[cfg(feature = "tracing")]
use tracing::{info, warn};

#[cfg(feature = "tracing")]
use tangram_verify::geom::init_tracing;
#[cfg(not(feature = "tracing"))]
use tangram_verify::geom::init_with_level;

use tangram_verify::{
    verify_frame, CandidatePolygon, GlobalSnapTransform, PieceKind, Polygon, TargetPiece,
    VerificationResult, VerifyParams,
};

#[derive(Debug, Deserialize)]
struct ExampleInput {
    targets: Vec<TargetPiece>,
    candidates: Vec<CandidatePolygon>,
    #[serde(default)]
    params: Option<VerifyParams>,
}

#[derive(Debug, Serialize)]
struct ExampleReport {
    matched: usize,
    result: VerificationResult,
    snap: Option<GlobalSnapTransform>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(not(feature = "tracing"))]
    init_with_level(LevelFilter::Debug)?;
    #[cfg(feature = "tracing")]
    init_tracing(false);

    let input = match env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        }
        None => demo_input(),
    };
    let params = input.params.unwrap_or_default();

    let frame = verify_frame(&input.targets, &input.candidates, &params)?;
    info!(
        "{} of {} targets matched",
        frame.result.matched_count(),
        input.targets.len()
    );
    if frame.snap.is_none() {
        warn!("no matches, no global snap to apply");
    }

    let report = ExampleReport {
        matched: frame.result.matched_count(),
        result: frame.result,
        snap: frame.snap,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Square + two small triangles, with the whole arrangement shifted a bit
/// off the template the way a drifted camera pose would.
fn demo_input() -> ExampleInput {
    let drift = Vector2::new(4.0, -3.0);

    let square = Polygon::new(vec![
        Point2::new(-20.0, -20.0),
        Point2::new(20.0, -20.0),
        Point2::new(20.0, 20.0),
        Point2::new(-20.0, 20.0),
    ]);
    let triangle = |apex: Point2<f32>| {
        Polygon::new(vec![
            apex,
            Point2::new(apex.x + 30.0, apex.y),
            Point2::new(apex.x, apex.y + 30.0),
        ])
    };

    let targets = vec![
        TargetPiece {
            id: "square".into(),
            kind: PieceKind::Square,
            polygon: square.clone(),
        },
        TargetPiece {
            id: "tri-1".into(),
            kind: PieceKind::SmallTriangle,
            polygon: triangle(Point2::new(40.0, 0.0)),
        },
        TargetPiece {
            id: "tri-2".into(),
            kind: PieceKind::SmallTriangle,
            polygon: triangle(Point2::new(-80.0, 10.0)),
        },
    ];
    let candidates = targets
        .iter()
        .map(|t| CandidatePolygon {
            kind: t.kind,
            polygon: t.polygon.translated(drift),
        })
        .collect();

    ExampleInput {
        targets,
        candidates,
        params: None,
    }
}
