use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Affine map from shape-local coordinates to screen coordinates, laid out like
/// `SVGMatrix` / `getScreenCTM()`:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for ScreenTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScreenTransform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Uniform scale followed by a translation, the shape a `viewBox` fit produces.
    #[cfg(test)]
    pub(crate) const fn scale_translate(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            a: scale,
            b: 0.0,
            c: 0.0,
            d: scale,
            e: offset_x,
            f: offset_y,
        }
    }

    /// Convert shape-local coordinates to screen coordinates.
    pub fn local_to_screen(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Convert screen coordinates to shape-local coordinates.
    /// Returns `None` when the matrix is singular (e.g. a zero-size layout).
    pub fn screen_to_local(&self, p: Point) -> Option<Point> {
        self.inverse().map(|inv| inv.local_to_screen(p))
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_close(actual: Point, expected: Point) {
        let dx = (actual.x - expected.x).abs();
        let dy = (actual.y - expected.y).abs();
        assert!(
            dx < 1e-9 && dy < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn scale_translate_maps_points() {
        let t = ScreenTransform::scale_translate(2.0, 100.0, 50.0);
        assert_point_close(
            t.local_to_screen(Point::new(10.0, 20.0)),
            Point::new(120.0, 90.0),
        );
    }

    #[test]
    fn inverse_round_trips_general_affine() {
        let t = ScreenTransform {
            a: 1.5,
            b: 0.25,
            c: -0.5,
            d: 2.0,
            e: 30.0,
            f: -12.0,
        };
        let local = Point::new(42.0, -7.5);
        let screen = t.local_to_screen(local);
        let back = t.screen_to_local(screen).expect("invertible");
        assert_point_close(back, local);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let t = ScreenTransform::scale_translate(0.0, 10.0, 10.0);
        assert!(t.inverse().is_none());
        assert!(t.screen_to_local(Point::new(1.0, 1.0)).is_none());
    }
}
