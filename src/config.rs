use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub vision: VisionConfig,
    pub grid: GridConfig,
    pub planner: PlannerConfig,
    pub steering: SteeringConfig,
    pub pursuit: PursuitConfig,
    pub radio: RadioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Number of detection workers in the pool.
    pub workers: usize,
    /// Minimum interval between frame hand-offs to workers, in milliseconds.
    pub dispatch_interval_ms: u64,
    /// Physical side length of a robot marker, in centimeters. Used for the
    /// pixel-to-centimeter calibration.
    pub marker_size_cm: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Side length of one grid cell, in pixels.
    pub cell_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minimum clearance (in cells) a cell must have to be traversable.
    pub clearance_level: u32,
    /// Markers closer than this to a cell center make the cell impassable,
    /// in centimeters.
    pub exclusion_radius_cm: f32,
    /// Minimum interval between path recomputations, in milliseconds.
    pub replan_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringConfig {
    /// Absolute cap for a single motor power value.
    pub max_power: i32,
    /// Proportional gain of the turn controller.
    pub p_gain: f32,
    /// Derivative gain of the turn controller.
    pub d_gain: f32,
    /// Below this absolute turn angle (degrees) the robot drives on
    /// differential motor powers instead of a turn-in-place command.
    pub motors_angle_thresh: i32,
    /// Speed argument for turn-in-place commands.
    pub turn_speed: i32,
    /// Waypoints closer than this to the robot are skipped, in centimeters.
    pub closest_node_dist_cm: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PursuitConfig {
    /// Marker id of the pursued robot. Pursuers plan around every other
    /// marker but never treat this one as an obstacle.
    pub target_id: u32,
    /// Consecutive undetected snapshots before a robot is dropped from
    /// tracking.
    pub undetected_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Serial device path. When absent, frames are logged instead of sent.
    pub device: Option<String>,
    pub baud_rate: u32,
    /// Preamble byte of the wire format.
    pub preamble: u32,
    /// Expiry window for a stop command, in milliseconds.
    pub end_hold_ms: u64,
    /// Maximum assumed execution time of a drive command, in milliseconds.
    pub drive_deadline_ms: u64,
    /// Maximum assumed execution time of a turn command, in milliseconds.
    pub turn_deadline_ms: u64,
    /// Upper bound on consecutive stop-all fallback frames.
    pub max_stop_all: u32,
    /// Minimum interval between logged radio buffers, in milliseconds.
    pub log_interval_ms: u64,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vision: VisionConfig {
                workers: 3,
                dispatch_interval_ms: 17,
                marker_size_cm: 8.0,
            },
            grid: GridConfig { cell_size: 8 },
            planner: PlannerConfig {
                clearance_level: 1,
                exclusion_radius_cm: 15.0,
                replan_interval_ms: 100,
            },
            steering: SteeringConfig {
                max_power: 200,
                p_gain: 5.0,
                d_gain: 1.0,
                motors_angle_thresh: 30,
                turn_speed: 100,
                closest_node_dist_cm: 5.0,
            },
            pursuit: PursuitConfig {
                target_id: 1,
                undetected_limit: 10,
            },
            radio: RadioConfig {
                device: None,
                baud_rate: 115_200,
                preamble: 0,
                end_hold_ms: 500,
                drive_deadline_ms: 7500,
                turn_deadline_ms: 2000,
                max_stop_all: 10,
                log_interval_ms: 80,
            },
        }
    }
}
