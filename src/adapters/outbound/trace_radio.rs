use crate::domains::radio::RadioChannel;
use std::io;
use tracing::info;

/// Diagnostic radio channel that logs frames instead of transmitting them.
/// Stands in for the serial link when no device is configured.
#[derive(Debug, Default)]
pub struct TraceRadio {
    sent: u64,
}

impl TraceRadio {
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl RadioChannel for TraceRadio {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sent += 1;
        info!(buffer = %String::from_utf8_lossy(bytes), "radio frame (trace only)");
        Ok(())
    }

    fn close(&mut self) {
        info!(frames = self.sent, "trace radio closed");
    }
}
