use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// Area below which a polygon is treated as degenerate (all vertices
/// collinear or coincident). Coordinates are expected to be in pixel-scale
/// units, so this is far below any real piece outline.
pub(crate) const DEGENERATE_AREA_EPS: f64 = 1e-9;

/// A simple 2D polygon: an ordered vertex list, implicitly closed (the last
/// vertex connects back to the first).
///
/// No winding convention is enforced. Routines that care about orientation
/// (clipping, centroid) derive it locally from the signed area, so callers
/// may supply vertices in either order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point2<f32>>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2<f32>>) -> Self {
        Self { vertices }
    }

    /// A polygon needs at least 3 vertices to bound any area. Inputs that
    /// fail this are tolerated everywhere and simply behave as empty.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Shoelace formula. Positive result means counter-clockwise winding in
    /// a right-handed, y-up frame. Accumulates in f64 to keep cancellation
    /// under control for pixel-scale coordinates.
    pub fn signed_area(&self) -> f32 {
        if !self.is_valid() {
            return 0.0;
        }
        let n = self.vertices.len();
        let mut acc = 0.0_f64;
        for i in 0..n {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            acc += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
        }
        (0.5 * acc) as f32
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    /// Area-weighted polygon centroid.
    ///
    /// Degenerate polygons (near-zero signed area, e.g. collinear vertices)
    /// fall back to the arithmetic mean of the vertices so the result stays
    /// finite instead of dividing by near-zero.
    pub fn centroid(&self) -> Point2<f32> {
        if self.vertices.is_empty() {
            return Point2::origin();
        }

        let n = self.vertices.len();
        let mut area_acc = 0.0_f64;
        let mut cx = 0.0_f64;
        let mut cy = 0.0_f64;
        for i in 0..n {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            let cross = a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
            area_acc += cross;
            cx += (a.x as f64 + b.x as f64) * cross;
            cy += (a.y as f64 + b.y as f64) * cross;
        }
        let signed_area = 0.5 * area_acc;

        if signed_area.abs() < DEGENERATE_AREA_EPS || n < 3 {
            return self.vertex_mean();
        }

        let scale = 1.0 / (6.0 * signed_area);
        Point2::new((cx * scale) as f32, (cy * scale) as f32)
    }

    fn vertex_mean(&self) -> Point2<f32> {
        let n = self.vertices.len() as f32;
        let mut sum = Vector2::zeros();
        for v in &self.vertices {
            sum += v.coords;
        }
        Point2::from(sum / n)
    }

    /// Rotate every vertex about `pivot` by `angle_rad` (counter-clockwise
    /// positive, consistent with [`Polygon::signed_area`]).
    pub fn rotated_about(&self, pivot: Point2<f32>, angle_rad: f32) -> Polygon {
        let rot = Rotation2::new(angle_rad);
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|v| pivot + rot * (v - pivot))
                .collect(),
        }
    }

    pub fn translated(&self, offset: Vector2<f32>) -> Polygon {
        Polygon {
            vertices: self.vertices.iter().map(|v| v + offset).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(cx: f32, cy: f32, half: f32) -> Polygon {
        Polygon::new(vec![
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ])
    }

    #[test]
    fn signed_area_follows_winding() {
        let ccw = square(0.0, 0.0, 1.0);
        assert_relative_eq!(ccw.signed_area(), 4.0, epsilon = 1e-5);

        let cw = Polygon::new(ccw.vertices.iter().rev().cloned().collect());
        assert_relative_eq!(cw.signed_area(), -4.0, epsilon = 1e-5);
        assert_relative_eq!(cw.area(), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn centroid_of_square_is_center() {
        let p = square(3.0, -2.0, 1.5);
        let c = p.centroid();
        assert_relative_eq!(c.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(c.y, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_centroid_falls_back_to_vertex_mean() {
        // All collinear: signed area is 0, the area-weighted formula would
        // divide by (near) zero.
        let p = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        ]);
        assert_relative_eq!(p.signed_area(), 0.0, epsilon = 1e-6);
        let c = p.centroid();
        assert_relative_eq!(c.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(c.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn too_few_vertices_is_invalid_and_area_free() {
        let p = Polygon::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(!p.is_valid());
        assert_eq!(p.signed_area(), 0.0);
    }

    #[test]
    fn rotation_about_centroid_keeps_centroid() {
        let p = square(5.0, 7.0, 2.0);
        let c = p.centroid();
        let r = p.rotated_about(c, 0.4);
        let rc = r.centroid();
        assert_relative_eq!(rc.x, c.x, epsilon = 1e-4);
        assert_relative_eq!(rc.y, c.y, epsilon = 1e-4);
        assert_relative_eq!(r.area(), p.area(), epsilon = 1e-3);
    }

    #[test]
    fn translation_moves_centroid() {
        let p = square(0.0, 0.0, 1.0);
        let t = p.translated(Vector2::new(2.0, -3.0));
        let c = t.centroid();
        assert_relative_eq!(c.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(c.y, -3.0, epsilon = 1e-5);
    }
}
