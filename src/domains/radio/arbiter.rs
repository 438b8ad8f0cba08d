use super::protocol::{CommandKind, BUFFER_END, STOP_ALL_FRAME};
use crate::common::Point2;
use crate::config::RadioConfig;
use crate::domains::robot::RobotModel;
use std::collections::BTreeMap;
use tracing::debug;

/// Position delta (per axis, in frame units) below which a robot counts as
/// converged on a recorded point.
const POSITION_EPS: f32 = 5.0;
/// Heading delta (degrees) below which a recorded command still matches.
const ANGLE_EPS: f32 = 5.0;
/// Motor power delta below which a motor-set resend is pointless.
const POWER_EPS: i32 = 5;

/// One freshly computed command candidate for a robot, with the robot state
/// the arbiter needs to judge it against the command in flight.
#[derive(Debug, Clone)]
pub struct TickCommand {
    pub robot_id: u32,
    pub kind: CommandKind,
    pub frame: String,
    pub center: Point2,
    pub mid: Point2,
    pub target: Point2,
    pub target_angle: f32,
    pub motor_powers: (i32, i32),
}

impl TickCommand {
    pub fn from_robot(robot: &RobotModel, kind: CommandKind, frame: String) -> Self {
        Self {
            robot_id: robot.id(),
            kind,
            frame,
            center: robot.center(),
            mid: robot.mid(),
            target: robot.target(),
            target_angle: robot.target_angle(),
            motor_powers: robot.motor_powers(),
        }
    }
}

/// One decision tick's worth of command candidates, handed from the
/// decision loop to the transmitter. A newer bundle always supersedes an
/// undelivered one.
#[derive(Debug, Clone, Default)]
pub struct TickCommands {
    pub commands: Vec<TickCommand>,
    /// Robots still tracked after this tick; records for anyone else are
    /// dropped once the tick is arbitrated.
    pub tracked: Vec<u32>,
    pub time_ms: u64,
}

/// Type-specific convergence target recorded when a command is sent.
#[derive(Debug, Clone)]
enum Convergence {
    Stop { point: Point2 },
    Drive { point: Point2, angle: f32 },
    Turn { angle: f32 },
    Motors { left: i32, right: i32 },
}

#[derive(Debug, Clone)]
struct ActiveCommand {
    deadline_ms: u64,
    convergence: Convergence,
}

/// Per-robot transmission debouncer.
///
/// Holds the one command assumed to be executing per robot and decides, for
/// every freshly computed candidate, whether it supersedes that command.
/// The goal is a link that is neither flooded (identical commands are not
/// repeated while they still converge) nor starved (expired or diverged
/// commands are always resent).
pub struct CommandArbiter {
    active: BTreeMap<u32, ActiveCommand>,
    stop_all_count: u32,
    end_hold_ms: u64,
    drive_deadline_ms: u64,
    turn_deadline_ms: u64,
    max_stop_all: u32,
}

impl CommandArbiter {
    pub fn new(radio: &RadioConfig) -> Self {
        Self {
            active: BTreeMap::new(),
            stop_all_count: 0,
            end_hold_ms: radio.end_hold_ms,
            drive_deadline_ms: radio.drive_deadline_ms,
            turn_deadline_ms: radio.turn_deadline_ms,
            max_stop_all: radio.max_stop_all,
        }
    }

    /// Arbitrate one tick of candidates into an outgoing buffer.
    ///
    /// Returns `None` when nothing needs the air. With no candidates at all
    /// (no robots tracked) the active records are cleared and a rate-limited
    /// stop-all fallback is emitted instead, capped at `max_stop_all`
    /// consecutive sends.
    pub fn assemble(&mut self, commands: &[TickCommand], now_ms: u64) -> Option<String> {
        if commands.is_empty() {
            self.active.clear();
            return self.stop_all();
        }

        let mut buffer = String::new();
        for cmd in commands {
            if self.supersedes(cmd, now_ms) {
                buffer.push_str(&cmd.frame);
            }
        }
        if buffer.is_empty() {
            return None;
        }
        buffer.push_str(BUFFER_END);
        self.stop_all_count = 0;
        Some(buffer)
    }

    /// Drop records for robots that are no longer tracked.
    pub fn prune(&mut self, tracked: &[u32]) {
        self.active.retain(|id, _| tracked.contains(id));
    }

    fn stop_all(&mut self) -> Option<String> {
        if self.stop_all_count >= self.max_stop_all {
            return None;
        }
        self.stop_all_count += 1;
        debug!(attempt = self.stop_all_count, "no robots tracked, stop-all fallback");
        Some(format!("{STOP_ALL_FRAME}{BUFFER_END}"))
    }

    /// Decide whether the candidate supersedes the command in flight, and
    /// refresh the record when it does.
    fn supersedes(&mut self, cmd: &TickCommand, now_ms: u64) -> bool {
        let record = self.active.get(&cmd.robot_id);
        let send = match cmd.kind {
            // A stop is pointless before anything was ever sent. Against a
            // previous stop it is repeated only once the hold window expired
            // or the robot drifted off the recorded stop point.
            CommandKind::End => match record {
                None => false,
                Some(rec) => match &rec.convergence {
                    Convergence::Stop { point } => {
                        !(now_ms < rec.deadline_ms && within(*point, cmd.mid))
                    }
                    _ => true,
                },
            },
            // A drive is suppressed only while the previous drive still has
            // time left, aims at the same heading and the robot sits at the
            // recorded target.
            CommandKind::Drive => match record {
                Some(rec) => match &rec.convergence {
                    Convergence::Drive { point, angle } => {
                        !(now_ms < rec.deadline_ms
                            && (angle - cmd.target_angle).abs() < ANGLE_EPS
                            && within(*point, cmd.center))
                    }
                    _ => true,
                },
                None => true,
            },
            CommandKind::Turn => match record {
                Some(rec) => match &rec.convergence {
                    Convergence::Turn { angle } => {
                        !(now_ms < rec.deadline_ms
                            && (angle - cmd.target_angle).abs() < ANGLE_EPS)
                    }
                    _ => true,
                },
                None => true,
            },
            CommandKind::MotorSet => match record {
                Some(rec) => match &rec.convergence {
                    Convergence::Motors { left, right } => {
                        (left - cmd.motor_powers.0).abs() > POWER_EPS
                            || (right - cmd.motor_powers.1).abs() > POWER_EPS
                    }
                    _ => true,
                },
                None => true,
            },
        };

        if send {
            self.record(cmd, now_ms);
        }
        send
    }

    fn record(&mut self, cmd: &TickCommand, now_ms: u64) {
        let active = match cmd.kind {
            CommandKind::End => ActiveCommand {
                deadline_ms: now_ms + self.end_hold_ms,
                convergence: Convergence::Stop { point: cmd.mid },
            },
            CommandKind::Drive => ActiveCommand {
                deadline_ms: now_ms + self.drive_deadline_ms,
                convergence: Convergence::Drive {
                    point: cmd.target,
                    angle: cmd.target_angle,
                },
            },
            CommandKind::Turn => ActiveCommand {
                deadline_ms: now_ms + self.turn_deadline_ms,
                convergence: Convergence::Turn {
                    angle: cmd.target_angle,
                },
            },
            CommandKind::MotorSet => ActiveCommand {
                deadline_ms: now_ms,
                convergence: Convergence::Motors {
                    left: cmd.motor_powers.0,
                    right: cmd.motor_powers.1,
                },
            },
        };
        self.active.insert(cmd.robot_id, active);
    }
}

fn within(a: Point2, b: Point2) -> bool {
    (a.x - b.x).abs() < POSITION_EPS && (a.y - b.y).abs() < POSITION_EPS
}
