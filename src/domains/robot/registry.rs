use super::RobotModel;
use crate::config::SteeringConfig;
use crate::domains::vision::Detection;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Tracks one `RobotModel` per detected marker across snapshots.
///
/// A robot missing from a snapshot is not dropped immediately: it survives a
/// configurable number of consecutive undetected snapshots (markers flicker
/// under occlusion and glare) and is reinstated as soon as it reappears.
pub struct RobotRegistry {
    robots: BTreeMap<u32, RobotModel>,
    undetected_limit: u32,
    max_power: i32,
    p_gain: f32,
    d_gain: f32,
}

impl RobotRegistry {
    pub fn new(steering: &SteeringConfig, undetected_limit: u32) -> Self {
        Self {
            robots: BTreeMap::new(),
            undetected_limit,
            max_power: steering.max_power,
            p_gain: steering.p_gain,
            d_gain: steering.d_gain,
        }
    }

    /// Fold one snapshot into the registry: update or create a model per
    /// detection, age the rest, and return the robots that just fell out of
    /// tracking (their last known state, for a final stop command).
    pub fn observe(&mut self, detections: &[Detection]) -> Vec<RobotModel> {
        for det in detections {
            match self.robots.get_mut(&det.marker_id) {
                Some(robot) => {
                    robot.update(det.corners);
                    robot.undetected = 0;
                }
                None => {
                    info!(marker = det.marker_id, "tracking new robot");
                    self.robots.insert(
                        det.marker_id,
                        RobotModel::new(
                            det.marker_id,
                            det.corners,
                            self.max_power,
                            self.p_gain,
                            self.d_gain,
                        ),
                    );
                }
            }
        }

        let mut dropped = Vec::new();
        let limit = self.undetected_limit;
        self.robots.retain(|id, robot| {
            if detections.iter().any(|det| det.marker_id == *id) {
                return true;
            }
            robot.undetected += 1;
            if robot.undetected > limit {
                debug!(marker = id, "robot lost, dropping from tracking");
                dropped.push(robot.clone());
                false
            } else {
                true
            }
        });
        dropped
    }

    pub fn robots(&self) -> impl Iterator<Item = &RobotModel> {
        self.robots.values()
    }

    pub fn get(&self, id: u32) -> Option<&RobotModel> {
        self.robots.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut RobotModel> {
        self.robots.get_mut(&id)
    }

    pub fn is_tracked(&self, id: u32) -> bool {
        self.robots.contains_key(&id)
    }

    pub fn tracked_ids(&self) -> Vec<u32> {
        self.robots.keys().copied().collect()
    }
}
