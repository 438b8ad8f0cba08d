use crate::common::{Point2, Vec2};

/// Tolerance for the collinearity test: cross products below this count as
/// "point on the supporting line".
const ON_LINE_EPS: f32 = 1e-6;

/// A 2D line segment with a cached axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSeg {
    a: Point2,
    b: Point2,
    bbox_min: Point2,
    bbox_max: Point2,
}

impl LineSeg {
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            a,
            b,
            bbox_min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            bbox_max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn first(&self) -> Point2 {
        self.a
    }

    pub fn second(&self) -> Point2 {
        self.b
    }

    /// Segment intersection via bounding-box pre-filter plus a mutual
    /// straddle test: the segments intersect iff their boxes overlap and each
    /// segment's endpoints lie on opposite sides of (or on) the other
    /// segment's supporting line. Collinear touches count as intersecting.
    pub fn intersects(&self, other: &LineSeg) -> bool {
        self.bbox_overlaps(other)
            && self.touches_or_crosses(other)
            && other.touches_or_crosses(self)
    }

    fn bbox_overlaps(&self, other: &LineSeg) -> bool {
        self.bbox_min.x <= other.bbox_max.x
            && self.bbox_max.x >= other.bbox_min.x
            && self.bbox_min.y <= other.bbox_max.y
            && self.bbox_max.y >= other.bbox_min.y
    }

    fn touches_or_crosses(&self, other: &LineSeg) -> bool {
        self.has_point(other.a)
            || self.has_point(other.b)
            || (self.point_right_of(other.a) ^ self.point_right_of(other.b))
    }

    fn has_point(&self, p: Point2) -> bool {
        let dir = Vec2::between(self.a, self.b);
        let to_p = Vec2::between(self.a, p);
        dir.cross(to_p).abs() < ON_LINE_EPS
    }

    fn point_right_of(&self, p: Point2) -> bool {
        let dir = Vec2::between(self.a, self.b);
        let to_p = Vec2::between(self.a, p);
        dir.cross(to_p) < 0.0
    }
}
