use serde::{Deserialize, Serialize};

/// 2D point in frame pixel coordinates (origin top-left, y growing down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Point2) -> f32 {
        Vec2::between(self, other).length()
    }
}

/// 2D displacement vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector pointing from `from` to `to`.
    pub fn between(from: Point2, to: Point2) -> Self {
        Self::new(to.x - from.x, to.y - from.y)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_and_midpoint() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_relative_eq!(a.distance(b), 5.0);
        assert_eq!(a.midpoint(b), Point2::new(1.5, 2.0));
    }

    #[test]
    fn cross_sign_tells_side() {
        let v = Vec2::new(1.0, 0.0);
        assert!(v.cross(Vec2::new(0.0, 1.0)) > 0.0);
        assert!(v.cross(Vec2::new(0.0, -1.0)) < 0.0);
    }
}
