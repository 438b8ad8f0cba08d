use crate::common::{Clock, Point2};
use crate::config::Config;
use crate::domains::grid::{Grid, GridCell, LineSeg, PathFinder, PathRequest};
use crate::domains::radio::{CommandKind, CommandProtocol, TickCommand, TickCommands};
use crate::domains::robot::{RobotModel, RobotRegistry};
use crate::domains::vision::{DetectionSnapshot, PixelScale, SnapshotReader};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The decision loop: consumes detection snapshots and turns them into
/// per-tick command candidates for the transmitter.
///
/// Per snapshot it updates the tracked robots, refreshes the grid occupancy
/// overlay, replans paths toward the pursued marker at a bounded cadence,
/// and derives one steering command per pursuing robot. The lattice itself
/// is built once, from the first usable frame, with walls and clearance
/// computed in the same pass.
pub struct Engine {
    config: Config,
    reader: SnapshotReader,
    clock: Clock,
    protocol: CommandProtocol,
    pathfinder: PathFinder,
    registry: RobotRegistry,
    wall_segments: Vec<LineSeg>,
    grid: Option<Grid>,
    paths: BTreeMap<u32, Vec<GridCell>>,
    pixel_scale: Option<PixelScale>,
    last_snapshot_ms: u64,
    last_plan_ms: u64,
    tick_tx: watch::Sender<TickCommands>,
}

impl Engine {
    pub fn new(
        config: &Config,
        reader: SnapshotReader,
        wall_segments: Vec<LineSeg>,
        clock: Clock,
        tick_tx: watch::Sender<TickCommands>,
    ) -> Self {
        Self {
            protocol: CommandProtocol::new(config.radio.preamble),
            pathfinder: PathFinder::new(config.planner.exclusion_radius_cm),
            registry: RobotRegistry::new(&config.steering, config.pursuit.undetected_limit),
            config: config.clone(),
            reader,
            clock,
            wall_segments,
            grid: None,
            paths: BTreeMap::new(),
            pixel_scale: None,
            last_snapshot_ms: 0,
            last_plan_ms: 0,
            tick_tx,
        }
    }

    /// Long-running decision loop. Snapshots already processed (same frame
    /// timestamp) are skipped; every new one produces a tick for the
    /// transmitter. Stops when the shutdown flag flips or the transmitter
    /// goes away.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_millis(2));
        loop {
            tokio::select! {
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {}
            }

            let snapshot = self.reader.snapshot().await;
            if snapshot.frame.time_ms <= self.last_snapshot_ms {
                continue;
            }
            let tick = self.step(&snapshot);
            if self.tick_tx.send(tick).is_err() {
                break;
            }
        }
        debug!("decision loop stopped");
    }

    /// Process one snapshot into a tick of command candidates.
    pub fn step(&mut self, snapshot: &DetectionSnapshot) -> TickCommands {
        self.last_snapshot_ms = snapshot.frame.time_ms;

        let dropped = self.registry.observe(&snapshot.detections);

        if self.grid.is_none() && !snapshot.frame.is_empty() {
            let mut grid = Grid::new(
                snapshot.frame.width,
                snapshot.frame.height,
                self.config.grid.cell_size,
            );
            grid.detect_walls(&self.wall_segments);
            grid.add_clearance();
            info!(
                cols = grid.cols(),
                rows = grid.rows(),
                "planning lattice built"
            );
            self.grid = Some(grid);
        }

        if self.pixel_scale.is_none() {
            self.pixel_scale = snapshot.detections.iter().find_map(|det| {
                PixelScale::from_marker(&det.corners, self.config.vision.marker_size_cm)
            });
            if self.pixel_scale.is_some() {
                info!("pixel scale calibrated from first marker");
            }
        }

        let mut commands = Vec::new();
        let now = self.clock.now_ms();
        let target_tracked = self.registry.is_tracked(self.config.pursuit.target_id);

        if let Some(grid) = self.grid.as_mut() {
            grid.refresh_occupancy(&snapshot.detections);
        }

        if target_tracked {
            if let Some(grid) = &self.grid {
                if self.last_plan_ms == 0
                    || now.saturating_sub(self.last_plan_ms)
                        > self.config.planner.replan_interval_ms
                {
                    let planned = self.plan_paths(grid, snapshot);
                    for (id, path) in planned {
                        self.paths.insert(id, path);
                    }
                    self.last_plan_ms = now;
                }
            }
            commands = self.steer_commands();
        }

        // a robot that fell out of tracking gets one final stop
        for robot in &dropped {
            self.paths.remove(&robot.id());
            match self.protocol.generate(robot.id(), CommandKind::End, &[0]) {
                Ok(frame) => commands.push(TickCommand::from_robot(robot, CommandKind::End, frame)),
                Err(err) => warn!(robot = robot.id(), %err, "stop encoding failed"),
            }
        }

        TickCommands {
            commands,
            tracked: self.registry.tracked_ids(),
            time_ms: snapshot.frame.time_ms,
        }
    }

    /// Plan a route per pursuing robot toward the pursued marker. Robots
    /// whose start or target fall off the lattice keep their previous path.
    fn plan_paths(&self, grid: &Grid, snapshot: &DetectionSnapshot) -> Vec<(u32, Vec<GridCell>)> {
        let target_id = self.config.pursuit.target_id;
        let Some(target_robot) = self.registry.get(target_id) else {
            return Vec::new();
        };
        let Some(target_index) = grid.index_for_point(target_robot.center()) else {
            return Vec::new();
        };

        let mut planned = Vec::new();
        for robot in self.registry.robots() {
            if robot.id() == target_id {
                continue;
            }
            let Some(start_index) = grid.index_for_point(robot.center()) else {
                continue;
            };
            let request = PathRequest {
                start: start_index,
                target: target_index,
                clearance_level: self.config.planner.clearance_level,
                owner_id: robot.id(),
                protected_id: Some(target_id),
                avoid_markers: true,
                detections: &snapshot.detections,
                pixel_scale: self.pixel_scale,
            };
            planned.push((robot.id(), self.pathfinder.astar(grid, &request)));
        }
        planned
    }

    /// Turn each planned path into one command candidate: motor powers when
    /// the robot is already roughly facing its waypoint, a turn in place
    /// otherwise, a stop when there is no route.
    fn steer_commands(&mut self) -> Vec<TickCommand> {
        let Some(scale) = self.pixel_scale else {
            // not calibrated yet, nothing sensible to steer by
            return Vec::new();
        };
        let target_id = self.config.pursuit.target_id;
        let thresh = self.config.steering.motors_angle_thresh;
        let turn_speed = self.config.steering.turn_speed;
        let closest_cm = self.config.steering.closest_node_dist_cm;

        let mut commands = Vec::new();
        for id in self.registry.tracked_ids() {
            if id == target_id {
                continue;
            }
            let Some(path) = self.paths.get(&id) else {
                continue;
            };
            let Some(robot) = self.registry.get_mut(id) else {
                continue;
            };

            if path.is_empty() {
                match self.protocol.generate(id, CommandKind::End, &[0]) {
                    Ok(frame) => {
                        commands.push(TickCommand::from_robot(robot, CommandKind::End, frame));
                    }
                    Err(err) => warn!(robot = id, %err, "stop encoding failed"),
                }
                continue;
            }

            let waypoint = select_waypoint(path, robot, scale, closest_cm);
            robot.set_target(waypoint);

            let turn = robot.target_angle().round() as i32;
            let encoded = if turn.abs() < thresh {
                let (left, right) = robot.motor_powers();
                self.protocol
                    .generate(id, CommandKind::MotorSet, &[left, right])
                    .map(|frame| (CommandKind::MotorSet, frame))
            } else {
                self.protocol
                    .generate(id, CommandKind::Turn, &[turn, turn_speed])
                    .map(|frame| (CommandKind::Turn, frame))
            };

            match encoded {
                Ok((kind, frame)) => commands.push(TickCommand::from_robot(robot, kind, frame)),
                Err(err) => {
                    warn!(robot = id, %err, "command encoding failed, skipping this tick");
                }
            }
        }
        commands
    }
}

/// Pick the waypoint to aim at: walking from the far end of the path, take
/// the farthest node still within the close-node distance of the robot; fall
/// back to the earliest node. A node inside the robot's own footprint is
/// skipped in favor of the one beyond it.
fn select_waypoint(
    path: &[GridCell],
    robot: &RobotModel,
    scale: PixelScale,
    closest_cm: f32,
) -> Point2 {
    if path.len() == 1 {
        return path[0].center;
    }

    let corners = robot.corners();
    let zone_corner = corners[2].midpoint(corners[3]);
    let zone_min = Point2::new(
        corners[0].x.min(zone_corner.x),
        corners[0].y.min(zone_corner.y),
    );
    let zone_max = Point2::new(
        corners[0].x.max(zone_corner.x),
        corners[0].y.max(zone_corner.y),
    );
    let in_zone = |p: Point2| {
        p.x >= zone_min.x && p.x < zone_max.x && p.y >= zone_min.y && p.y < zone_max.y
    };

    for idx in (1..path.len()).rev() {
        let node = &path[idx];
        if idx == 1 {
            return node.center;
        }
        if in_zone(node.center) {
            return path[(idx + 1).min(path.len() - 1)].center;
        }
        if scale.to_cm(node.center.distance(robot.mid())) <= closest_cm {
            return node.center;
        }
    }
    path[0].center
}
