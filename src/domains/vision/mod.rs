pub mod calibration;
pub mod coordinator;
pub mod ports;

pub use calibration::PixelScale;
pub use coordinator::{SnapshotReader, VisionCoordinator};
pub use ports::{Detector, FrameSource};

use crate::common::Point2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One camera frame: an opaque luma buffer plus the monotonic timestamp it
/// was captured at. Ordering and staleness checks use only the timestamp.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub time_ms: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Arc<[u8]>, time_ms: u64) -> Self {
        Self {
            width,
            height,
            data,
            time_ms,
        }
    }

    /// A failed acquisition: no pixels, but still carries its timestamp so
    /// downstream consumers can observe "no input" explicitly.
    pub fn empty(time_ms: u64) -> Self {
        Self {
            width: 0,
            height: 0,
            data: Arc::from([]),
            time_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty(0)
    }
}

/// One detected marker. Corners are ordered top-left, top-right,
/// bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub marker_id: u32,
    pub corners: [Point2; 4],
}

impl Detection {
    pub fn new(marker_id: u32, corners: [Point2; 4]) -> Self {
        Self { marker_id, corners }
    }

    /// Center of the marker, from the corner-0/corner-2 diagonal.
    pub fn center(&self) -> Point2 {
        self.corners[0].midpoint(self.corners[2])
    }
}

/// The newest internally-consistent detection result. Replaced atomically by
/// the vision coordinator; read-mostly everywhere else.
#[derive(Debug, Clone, Default)]
pub struct DetectionSnapshot {
    pub frame: Frame,
    pub detections: Vec<Detection>,
}
