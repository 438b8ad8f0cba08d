use crate::domains::radio::RadioChannel;
use std::io::{self, Write};
use std::time::Duration;
use tracing::info;

/// Radio link over a serial device. Writes are small command buffers, so a
/// short write timeout keeps the transmit task bounded even when the link
/// wedges.
pub struct SerialRadio {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialRadio {
    pub fn open(device: &str, baud_rate: u32) -> io::Result<Self> {
        let port = serialport::new(device, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(io::Error::other)?;
        info!(device, baud_rate, "serial radio opened");
        Ok(Self { port })
    }
}

impl RadioChannel for SerialRadio {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    fn close(&mut self) {
        let _ = self.port.flush();
    }
}
