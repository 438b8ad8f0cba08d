use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;

/// Separator between values in the data field.
pub const DATA_DELIM: char = ',';

/// Terminator closing a multi-command buffer.
pub const BUFFER_END: &str = "G";

/// Broadcast frame stopping every robot (id 0xFF, end command).
pub const STOP_ALL_FRAME: &str = "0000FF000107E";

/// Command types understood by the robot firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Stop; no meaningful payload.
    End,
    /// Drive a distance in millimeters.
    Drive,
    /// Turn by an angle in degrees at a given speed.
    Turn,
    /// Set left and right motor powers directly.
    MotorSet,
}

impl CommandKind {
    pub fn code(self) -> u32 {
        match self {
            CommandKind::End => 0,
            CommandKind::Drive => 1,
            CommandKind::Turn => 2,
            CommandKind::MotorSet => 3,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("preamble {0} does not fit in one byte")]
    PreambleRange(u32),
    #[error("robot id {0} does not fit in one byte")]
    IdRange(u32),
    #[error("data string length {0} outside 1..=255")]
    DataLength(usize),
}

/// Stateless encoder for the wire format consumed by the robot firmware.
///
/// Frames are ASCII uppercase hex: `PP PP ID TT LL data CC`, where `data` is
/// a comma-separated list of signed hex integers, `LL` its character count,
/// and `CC` the checksum over everything from `ID` onward. This layout is a
/// firmware contract; it must be reproduced byte for byte.
#[derive(Debug, Clone)]
pub struct CommandProtocol {
    preamble: u32,
}

impl CommandProtocol {
    pub fn new(preamble: u32) -> Self {
        Self { preamble }
    }

    /// Encode one command frame. Fails when the preamble or id does not fit
    /// in a byte or the rendered data string is empty or longer than 255
    /// characters; the caller logs and skips that robot for the tick.
    pub fn generate(
        &self,
        id: u32,
        kind: CommandKind,
        data: &[i32],
    ) -> Result<String, ProtocolError> {
        if self.preamble > 255 {
            return Err(ProtocolError::PreambleRange(self.preamble));
        }
        if id > 255 {
            return Err(ProtocolError::IdRange(id));
        }

        let mut data_str = String::new();
        for (i, value) in data.iter().enumerate() {
            if i > 0 {
                data_str.push(DATA_DELIM);
            }
            if *value < 0 {
                let _ = write!(data_str, "-{:X}", -(*value as i64));
            } else {
                let _ = write!(data_str, "{:X}", value);
            }
        }
        if data_str.is_empty() || data_str.len() > 255 {
            return Err(ProtocolError::DataLength(data_str.len()));
        }

        let mut frame = format!(
            "{:02X}{:02X}{:02X}{:02X}{:02X}{}",
            self.preamble,
            self.preamble,
            id,
            kind.code(),
            data_str.len(),
            data_str
        );

        // generate() always produces a frame long enough to checksum
        let checksum = checksum(&frame).ok_or(ProtocolError::DataLength(data_str.len()))?;
        let _ = write!(frame, "{:02X}", checksum);
        Ok(frame)
    }
}

/// Checksum over a frame missing its checksum field: the byte values of the
/// characters from offset 4 (the id) onward, summed modulo 255. `None` for
/// strings too short or too long to be a frame.
pub fn checksum(frame: &str) -> Option<u32> {
    let len = frame.len();
    if !(11..=512).contains(&len) {
        return None;
    }
    Some(frame.bytes().skip(4).map(u32::from).sum::<u32>() % 255)
}
