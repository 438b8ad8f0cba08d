pub mod arbiter;
pub mod ports;
pub mod protocol;

pub use arbiter::{CommandArbiter, TickCommand, TickCommands};
pub use ports::RadioChannel;
pub use protocol::{CommandKind, CommandProtocol, ProtocolError};
