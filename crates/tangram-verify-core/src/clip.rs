//! Polygon intersection and overlap scoring.
//!
//! The clipper is a generalized Sutherland–Hodgman: instead of assuming the
//! textbook counter-clockwise convex clip polygon, it derives the clip
//! polygon's winding from its signed area and orients the half-plane test
//! accordingly. Target and candidate outlines reach this code from different
//! upstream paths with no shared winding convention, so this is a
//! correctness requirement, not a convenience.
//!
//! Precondition: the clip polygon must be convex. Clipping against a
//! non-convex clip polygon produces undefined results. Tangram piece
//! outlines are all convex, so both operands qualify here.

use nalgebra::Point2;

use crate::polygon::Polygon;

/// Union area below this is treated as zero to avoid dividing by noise.
const UNION_AREA_EPS: f32 = 1e-6;

/// Tolerance for the on-edge test. Points exactly on a clip edge count as
/// inside, which keeps self-intersection exact.
const EDGE_EPS: f64 = 1e-9;

#[inline]
fn edge_side(a: Point2<f32>, b: Point2<f32>, p: Point2<f32>) -> f64 {
    let abx = b.x as f64 - a.x as f64;
    let aby = b.y as f64 - a.y as f64;
    let apx = p.x as f64 - a.x as f64;
    let apy = p.y as f64 - a.y as f64;
    abx * apy - aby * apx
}

/// Intersection of the infinite lines through (p1, p2) and (a, b), computed
/// in f64. Only called when the segment (p1, p2) crosses the clip edge's
/// line, so the denominator is well away from zero; the fallback covers the
/// numerically parallel remainder.
fn line_intersection(
    p1: Point2<f32>,
    p2: Point2<f32>,
    a: Point2<f32>,
    b: Point2<f32>,
) -> Point2<f32> {
    let d1x = p2.x as f64 - p1.x as f64;
    let d1y = p2.y as f64 - p1.y as f64;
    let d2x = b.x as f64 - a.x as f64;
    let d2y = b.y as f64 - a.y as f64;

    let denom = d1x * d2y - d1y * d2x;
    if denom.abs() < EDGE_EPS {
        return p2;
    }

    let t = ((a.x as f64 - p1.x as f64) * d2y - (a.y as f64 - p1.y as f64) * d2x) / denom;
    Point2::new(
        (p1.x as f64 + t * d1x) as f32,
        (p1.y as f64 + t * d1y) as f32,
    )
}

/// Clip `subject` against convex `clip` (Sutherland–Hodgman, either winding).
///
/// Returns the intersection polygon, which may be empty. A degenerate clip
/// polygon (near-zero area, or fewer than 3 vertices) yields the empty
/// polygon immediately.
pub fn intersect(subject: &Polygon, clip: &Polygon) -> Polygon {
    if !subject.is_valid() || !clip.is_valid() {
        return Polygon::new(Vec::new());
    }

    let clip_signed = clip.signed_area();
    if clip_signed.abs() < UNION_AREA_EPS {
        return Polygon::new(Vec::new());
    }
    // Positive signed area = counter-clockwise clip; flip the inside test
    // for clockwise input instead of rejecting it.
    let ccw = clip_signed > 0.0;
    let inside = |a: Point2<f32>, b: Point2<f32>, p: Point2<f32>| -> bool {
        let side = edge_side(a, b, p);
        if ccw {
            side >= -EDGE_EPS
        } else {
            side <= EDGE_EPS
        }
    };

    let mut output = subject.vertices.clone();
    let m = clip.vertices.len();
    for e in 0..m {
        if output.is_empty() {
            break;
        }
        let a = clip.vertices[e];
        let b = clip.vertices[(e + 1) % m];

        let input = std::mem::take(&mut output);
        let n = input.len();
        for i in 0..n {
            let prev = input[(i + n - 1) % n];
            let curr = input[i];
            let prev_in = inside(a, b, prev);
            let curr_in = inside(a, b, curr);
            match (prev_in, curr_in) {
                (true, true) => output.push(curr),
                (true, false) => output.push(line_intersection(prev, curr, a, b)),
                (false, true) => {
                    output.push(line_intersection(prev, curr, a, b));
                    output.push(curr);
                }
                (false, false) => {}
            }
        }
    }

    Polygon::new(output)
}

/// Intersection-over-Union of two convex polygons, in `[0, 1]`.
///
/// Returns 0 for disjoint, degenerate, or malformed inputs; no input is an
/// error.
pub fn iou(a: &Polygon, b: &Polygon) -> f32 {
    if !a.is_valid() || !b.is_valid() {
        return 0.0;
    }
    let inter = intersect(a, b);
    if !inter.is_valid() {
        return 0.0;
    }
    let inter_area = inter.area();
    let union = a.area() + b.area() - inter_area;
    if union <= UNION_AREA_EPS {
        return 0.0;
    }
    (inter_area / union).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn square(cx: f32, cy: f32, half: f32) -> Polygon {
        Polygon::new(vec![
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ])
    }

    fn reversed(p: &Polygon) -> Polygon {
        Polygon::new(p.vertices.iter().rev().cloned().collect())
    }

    #[test]
    fn self_intersection_is_total() {
        let p = square(0.0, 0.0, 1.0);
        assert_eq!(iou(&p, &p), 1.0);
    }

    #[test]
    fn disjoint_polygons_have_zero_iou() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(10.0, 0.0, 1.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn iou_is_symmetric_and_bounded() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(0.7, 0.3, 1.0);
        let ab = iou(&a, &b);
        let ba = iou(&b, &a);
        assert_relative_eq!(ab, ba, epsilon = 1e-5);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn half_unit_offset_squares_have_known_overlap() {
        // Two unit squares offset by (0.5, 0.5): intersection 0.25,
        // union 1.75, IoU 1/7.
        let a = square(0.5, 0.5, 0.5);
        let b = square(1.0, 1.0, 0.5);
        assert_relative_eq!(iou(&a, &b), 1.0 / 7.0, epsilon = 1e-4);
    }

    #[test]
    fn winding_order_does_not_change_overlap() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(0.8, 0.2, 1.0);
        let expected = iou(&a, &b);
        assert_relative_eq!(iou(&reversed(&a), &b), expected, epsilon = 1e-5);
        assert_relative_eq!(iou(&a, &reversed(&b)), expected, epsilon = 1e-5);
        assert_relative_eq!(iou(&reversed(&a), &reversed(&b)), expected, epsilon = 1e-5);
    }

    #[test]
    fn triangle_clipped_by_enclosing_square_is_unchanged() {
        let tri = Polygon::new(vec![
            Point2::new(-0.5, -0.5),
            Point2::new(0.5, -0.5),
            Point2::new(0.0, 0.5),
        ]);
        let clip = square(0.0, 0.0, 2.0);
        let inter = intersect(&tri, &clip);
        assert_relative_eq!(inter.area(), tri.area(), epsilon = 1e-5);
    }

    #[test]
    fn degenerate_clip_yields_empty_intersection() {
        let a = square(0.0, 0.0, 1.0);
        let line = Polygon::new(vec![
            Point2::new(-1.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
        ]);
        assert!(intersect(&a, &line).is_empty());
        assert_eq!(iou(&a, &line), 0.0);
    }

    #[test]
    fn malformed_input_is_unmatchable_not_fatal() {
        let a = square(0.0, 0.0, 1.0);
        let two_points = Polygon::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert_eq!(iou(&a, &two_points), 0.0);
        assert_eq!(iou(&two_points, &a), 0.0);
    }
}
