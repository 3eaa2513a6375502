//! Polygon geometry kernel for tangram arrangement verification.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about pieces, puzzles, or matching; it provides the polygon primitives
//! (area, centroid, clipping, IoU) the verification engine is built on.
//!
//! All operations are pure functions of their inputs: no shared state, no
//! I/O, no caching. Calls are safe to repeat and to run concurrently as long
//! as each call owns its inputs.

mod clip;
mod logger;
mod polygon;

pub use clip::{intersect, iou};
pub use polygon::Polygon;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
