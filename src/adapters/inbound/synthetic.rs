//! Scripted scene standing in for the camera and the marker detector.
//!
//! Markers move on deterministic linear tracks, so the same timestamp always
//! yields the same detections. Used by the demo binary and the integration
//! tests; a hardware camera plugs in through the same two ports.

use crate::common::{Clock, Point2};
use crate::domains::grid::LineSeg;
use crate::domains::vision::{Detection, Detector, Frame, FrameSource};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct MarkerTrack {
    id: u32,
    start: Point2,
    /// Pixels per second along each axis.
    velocity: (f32, f32),
    side_px: f32,
}

impl MarkerTrack {
    fn corners_at(&self, time_ms: u64) -> [Point2; 4] {
        let t = time_ms as f32 / 1000.0;
        let cx = self.start.x + self.velocity.0 * t;
        let cy = self.start.y + self.velocity.1 * t;
        let half = self.side_px / 2.0;
        [
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ]
    }
}

/// A fixed playing field with walls and scripted markers.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    width: u32,
    height: u32,
    walls: Vec<LineSeg>,
    markers: Vec<MarkerTrack>,
}

impl SyntheticScene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            walls: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn with_wall(mut self, a: Point2, b: Point2) -> Self {
        self.walls.push(LineSeg::new(a, b));
        self
    }

    /// Add a marker moving linearly from `start` at `velocity` px/s.
    pub fn with_marker(mut self, id: u32, start: Point2, velocity: (f32, f32), side_px: f32) -> Self {
        self.markers.push(MarkerTrack {
            id,
            start,
            velocity,
            side_px,
        });
        self
    }

    pub fn wall_segments(&self) -> Vec<LineSeg> {
        self.walls.clone()
    }
}

/// Frame source yielding empty-bodied frames of the scene's dimensions,
/// stamped from the shared monotonic clock.
pub struct SyntheticFrameSource {
    scene: Arc<SyntheticScene>,
    clock: Clock,
}

impl SyntheticFrameSource {
    pub fn new(scene: Arc<SyntheticScene>, clock: Clock) -> Self {
        Self { scene, clock }
    }
}

impl FrameSource for SyntheticFrameSource {
    fn next_frame(&mut self) -> Frame {
        Frame::new(
            self.scene.width,
            self.scene.height,
            Arc::from([]),
            self.clock.now_ms(),
        )
    }
}

/// Detector reporting every scripted marker at the frame's timestamp.
pub struct SyntheticDetector {
    scene: Arc<SyntheticScene>,
}

impl SyntheticDetector {
    pub fn new(scene: Arc<SyntheticScene>) -> Self {
        Self { scene }
    }
}

impl Detector for SyntheticDetector {
    fn detect(&self, frame: &Frame) -> Vec<Detection> {
        self.scene
            .markers
            .iter()
            .map(|track| Detection::new(track.id, track.corners_at(frame.time_ms)))
            .collect()
    }
}
