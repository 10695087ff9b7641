use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::traits::SerialLink;

/// Read timeout applied to the device. Reads only happen after
/// `bytes_to_read` reported data, so this bounds a misbehaving driver.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// A UART device opened through the `serialport` crate.
pub struct HardwareSerial {
    path: String,
    port: Box<dyn serialport::SerialPort>,
}

impl HardwareSerial {
    /// Open `path` at `baud_rate`, 8N1, no flow control.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.to_string(),
                source,
            })?;

        tracing::debug!(path, baud_rate, "serial device opened");
        Ok(Self {
            path: path.to_string(),
            port,
        })
    }

    /// Device path this link was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SerialLink for HardwareSerial {
    fn available(&mut self) -> Result<bool> {
        Ok(self.port.bytes_to_read()? > 0)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.port.set_baud_rate(baud_rate)?;
        tracing::debug!(path = %self.path, baud_rate, "serial speed changed");
        Ok(())
    }
}

impl std::fmt::Debug for HardwareSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareSerial")
            .field("path", &self.path)
            .finish()
    }
}
