use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Axis-aligned box in shape-local coordinates, as reported by `getBBox()`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn midpoint_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.midpoint_x(), self.y + self.height / 2.0)
    }

    pub fn top_center(&self) -> Point {
        Point::new(self.midpoint_x(), self.y)
    }

    pub fn bottom_center(&self) -> Point {
        Point::new(self.midpoint_x(), self.y + self.height)
    }
}

/// Screen-space rectangle (`getBoundingClientRect()`), in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert a screen point into coordinates relative to this rectangle.
    pub fn relative(&self, p: Point) -> Point {
        Point::new(p.x - self.left, p.y - self.top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_anchor_points() {
        let bbox = BoundingBox::new(10.0, 20.0, 40.0, 30.0);
        assert_eq!(bbox.center(), Point::new(30.0, 35.0));
        assert_eq!(bbox.top_center(), Point::new(30.0, 20.0));
        assert_eq!(bbox.bottom_center(), Point::new(30.0, 50.0));
    }

    #[test]
    fn screen_rect_relative() {
        let rect = ScreenRect::new(100.0, 50.0, 800.0, 600.0);
        assert_eq!(rect.relative(Point::new(150.0, 75.0)), Point::new(50.0, 25.0));
    }
}
