//! Geometry primitives shared across the pipeline.
//!
//! The whole engine works in `f64`. Position comparisons go through `EPSILON` so that
//! accumulated floating error never flips a containment or intersection test.

use serde::{Deserialize, Serialize};

/// Tolerance for floating intersection and containment tests.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn approx_eq(&self, other: &Point) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }
}

/// Axis-aligned box; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() - EPSILON
            && other.x < self.right() - EPSILON
            && self.y < other.bottom() - EPSILON
            && other.y < self.bottom() - EPSILON
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.x - EPSILON
            && p.x <= self.right() + EPSILON
            && p.y >= self.y - EPSILON
            && p.y <= self.bottom() + EPSILON
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    /// True if the open segment `a -> b` passes through the box interior. Segments that
    /// merely touch the border within `EPSILON` do not count.
    pub fn intersects_segment(&self, a: &Point, b: &Point) -> bool {
        if self.contains_point(a) && self.contains_point(b) {
            return true;
        }
        let corners = [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ];
        for i in 0..4 {
            if segments_intersect(a, b, &corners[i], &corners[(i + 1) % 4]) {
                return true;
            }
        }
        false
    }
}

/// Proper segment intersection. Shared endpoints are excluded so that consecutive
/// poly-line segments or edges leaving the same port never count as crossings.
pub fn segments_intersect(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> bool {
    if a1.approx_eq(b1) || a1.approx_eq(b2) || a2.approx_eq(b1) || a2.approx_eq(b2) {
        return false;
    }

    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
}

/// Intersection point of the (infinite) lines through `a1 -> a2` and `b1 -> b2`, if they
/// are not parallel.
pub fn line_intersection(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<Point> {
    let denom = (a1.x - a2.x) * (b1.y - b2.y) - (a1.y - a2.y) * (b1.x - b2.x);
    if denom.abs() <= EPSILON {
        return None;
    }
    let ta = a1.x * a2.y - a1.y * a2.x;
    let tb = b1.x * b2.y - b1.y * b2.x;
    Some(Point::new(
        (ta * (b1.x - b2.x) - (a1.x - a2.x) * tb) / denom,
        (ta * (b1.y - b2.y) - (a1.y - a2.y) * tb) / denom,
    ))
}

fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect() {
        let a1 = Point::new(0.0, 0.0);
        let a2 = Point::new(10.0, 10.0);
        let b1 = Point::new(0.0, 10.0);
        let b2 = Point::new(10.0, 0.0);
        assert!(segments_intersect(&a1, &a2, &b1, &b2));
    }

    #[test]
    fn shared_endpoints_do_not_count_as_crossings() {
        let o = Point::new(0.0, 0.0);
        let a = Point::new(10.0, 10.0);
        let b = Point::new(-10.0, 10.0);
        assert!(!segments_intersect(&o, &a, &o, &b));
    }

    #[test]
    fn touching_parallel_segments_do_not_intersect() {
        let a1 = Point::new(0.0, 0.0);
        let a2 = Point::new(10.0, 0.0);
        let b1 = Point::new(0.0, 5.0);
        let b2 = Point::new(10.0, 5.0);
        assert!(!segments_intersect(&a1, &a2, &b1, &b2));
    }

    #[test]
    fn rect_containment_tolerates_epsilon() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(-EPSILON / 2.0, 10.0, 50.0, 50.0);
        assert!(outer.contains_rect(&inner));
    }
}
