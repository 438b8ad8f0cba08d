use crate::common::{Point2, Vec2};

/// Reference vector for absolute heading angles, pointing "down" in frame
/// coordinates. Unit length.
const BASE_VEC: Vec2 = Vec2 { x: 0.0, y: 1.0 };

/// Hard cap on the configurable per-motor power magnitude.
const MAX_POWER_LIMIT: i32 = 1000;

/// Per-marker pose and steering state.
///
/// Marker corners are indexed top-left (0), top-right (1), bottom-right (2),
/// bottom-left (3). The center is the 0-2 diagonal midpoint, the mid point
/// sits between corners 0 and 1, and the heading vector runs center -> mid.
/// Turn angles are signed: positive clockwise, negative counter-clockwise.
#[derive(Debug, Clone)]
pub struct RobotModel {
    id: u32,
    max_power: i32,
    p_gain: f32,
    d_gain: f32,
    corners: [Point2; 4],
    center: Point2,
    mid: Point2,
    target: Point2,
    dir_vec: Vec2,
    dir_len: f32,
    target_vec: Vec2,
    target_len: f32,
    angle: f32,
    target_angle: f32,
    last_target_angle: f32,
    motor_powers: (i32, i32),
    /// Consecutive snapshots this robot went undetected in.
    pub undetected: u32,
}

impl RobotModel {
    pub fn new(id: u32, corners: [Point2; 4], max_power: i32, p_gain: f32, d_gain: f32) -> Self {
        let mut robot = Self {
            id,
            max_power: max_power.abs().min(MAX_POWER_LIMIT),
            p_gain,
            d_gain,
            corners,
            center: Point2::default(),
            mid: Point2::default(),
            target: Point2::new(-1.0, -1.0),
            dir_vec: Vec2::default(),
            dir_len: 0.0,
            target_vec: Vec2::default(),
            target_len: 0.0,
            angle: 0.0,
            target_angle: 0.0,
            last_target_angle: 0.0,
            motor_powers: (0, 0),
            undetected: 0,
        };
        robot.update(corners);
        robot
    }

    /// Recompute pose (center, mid, heading vector, absolute heading angle)
    /// from freshly detected corners.
    pub fn update(&mut self, corners: [Point2; 4]) {
        self.corners = corners;
        self.center = corners[0].midpoint(corners[2]);
        self.mid = corners[0].midpoint(corners[1]);
        self.dir_vec = Vec2::between(self.center, self.mid);
        self.dir_len = self.dir_vec.length();
        self.angle = self.heading_angle();
    }

    /// Point the robot at a target: derives the signed turn angle and the
    /// differential motor powers for chasing it.
    pub fn set_target(&mut self, target: Point2) {
        self.target = target;
        self.target_vec = Vec2::between(self.center, target);
        self.target_len = self.target_vec.length();

        self.last_target_angle = self.target_angle;
        self.target_angle = self.turn_angle();
        self.motor_powers = self.pd_motor_powers();
    }

    /// Absolute heading: angle between the base vector and the heading
    /// vector, mapped to [0, 360) by the heading's x sign.
    fn heading_angle(&self) -> f32 {
        let dot = self.dir_vec.dot(BASE_VEC);
        if dot == 0.0 || self.dir_len == 0.0 {
            return 0.0;
        }
        let degs = (dot / self.dir_len).acos().to_degrees();
        if self.dir_vec.x < 0.0 {
            180.0 + degs
        } else {
            180.0 - degs
        }
    }

    /// Signed angle from the heading vector to the target vector, normalized
    /// into (-180, 180]: positive means turn clockwise.
    fn turn_angle(&self) -> f32 {
        let dot = self.target_vec.dot(BASE_VEC);
        let rads = if self.target_len != 0.0 {
            (dot / self.target_len).acos()
        } else {
            0.0
        };
        let degs = rads.to_degrees();
        let degs = if self.target_vec.x < 0.0 {
            180.0 + degs
        } else {
            180.0 - degs
        };

        let turn = degs - self.angle;
        if turn > 180.0 {
            turn - 360.0
        } else if turn < -180.0 {
            turn + 360.0
        } else {
            turn
        }
    }

    /// Proportional-derivative law on the turn-angle error. The outer wheel
    /// stays pinned at max power, the inner one absorbs the correction,
    /// clamped to the configured magnitude.
    fn pd_motor_powers(&self) -> (i32, i32) {
        let u = self.p_gain * self.target_angle
            + self.d_gain * (self.last_target_angle - self.target_angle);

        let max = self.max_power as f32;
        let power_left = (max + u).clamp(-max, max);
        let power_right = (max - u).clamp(-max, max);

        if u > 0.0 {
            (self.max_power, power_right.round() as i32)
        } else {
            (power_left.round() as i32, self.max_power)
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn corners(&self) -> &[Point2; 4] {
        &self.corners
    }

    pub fn center(&self) -> Point2 {
        self.center
    }

    pub fn mid(&self) -> Point2 {
        self.mid
    }

    pub fn target(&self) -> Point2 {
        self.target
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    pub fn motor_powers(&self) -> (i32, i32) {
        self.motor_powers
    }
}
