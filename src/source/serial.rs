//! Serial device source.
//!
//! Reads from a serial port (typically a Bluetooth RFCOMM link such as
//! `/dev/rfcomm0`) without ever blocking: each poll first asks the driver how
//! many bytes are waiting and only reads those.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use super::{LineBuffer, LineSource};
use crate::error::SourceError;

/// Read timeout on the port. Reads are sized to what is already buffered, so
/// this only matters if the driver misreports availability.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// A line source backed by a serial port.
///
/// Opening fails loudly if the device is missing; once open, a device that
/// stops sending simply yields no lines.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    buffer: LineBuffer,
    description: String,
    last_error: Option<String>,
}

impl SerialSource {
    /// Open `path` at `baud_rate`, 8N1, no flow control.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, SourceError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| SourceError::Open {
                target: path.to_string(),
                reason: e.to_string(),
            })?;

        info!(port = path, baud_rate, "serial port opened");
        Ok(Self::from_port(port, &format!("{} @ {} baud", path, baud_rate)))
    }

    /// Wrap an already opened port.
    pub fn from_port(port: Box<dyn SerialPort>, description: &str) -> Self {
        Self {
            port,
            buffer: LineBuffer::new(),
            description: format!("serial: {}", description),
            last_error: None,
        }
    }

    /// Move whatever the driver has buffered into the line buffer.
    fn fill(&mut self) -> Result<(), SourceError> {
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| SourceError::Read(e.to_string()))? as usize;
        if available == 0 {
            return Ok(());
        }

        let mut chunk = vec![0u8; available];
        let n = self.port.read(&mut chunk).map_err(|e| SourceError::Read(e.to_string()))?;
        debug!(bytes = n, "read from serial port");
        self.buffer.extend(&chunk[..n]);
        Ok(())
    }
}

impl LineSource for SerialSource {
    fn poll_line(&mut self) -> Option<Vec<u8>> {
        if !self.buffer.has_line() {
            match self.fill() {
                Ok(()) => self.last_error = None,
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    return None;
                }
            }
        }
        self.buffer.pop_line()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

impl fmt::Debug for SerialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialSource")
            .field("description", &self.description)
            .field("buffered_lines", &self.buffer.len())
            .field("last_error", &self.last_error)
            .finish()
    }
}
