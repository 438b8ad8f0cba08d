pub mod serial;
pub mod trace_radio;

pub use serial::SerialRadio;
pub use trace_radio::TraceRadio;
