use crate::buffer::{FrameConfig, FramingMode, Message, ReceiveBuffer};
use crate::error::Result;
use crate::port::check_port;

/// Receive framing for every port of a device.
///
/// One [`ReceiveBuffer`] per port index, the console included so indices
/// line up; the console buffer is never touched because every entry point
/// goes through [`check_port`].
#[derive(Debug)]
pub struct FramingEngine {
    buffers: Vec<ReceiveBuffer>,
    config: FrameConfig,
}

impl FramingEngine {
    /// Create an engine for `port_count` ports with default configuration.
    pub fn new(port_count: usize) -> Self {
        Self::from_valid_config(port_count, FrameConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(port_count: usize, config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(port_count, config))
    }

    fn from_valid_config(port_count: usize, config: FrameConfig) -> Self {
        let buffers = (0..port_count)
            .map(|_| ReceiveBuffer::new(config.capacity))
            .collect();
        Self { buffers, config }
    }

    /// Feed one byte received on `port`.
    ///
    /// The caller has already checked that the port is enabled and that a
    /// byte was available; this never blocks. Returns the completed message
    /// when `byte` finishes one.
    pub fn ingest_byte(
        &mut self,
        port: usize,
        byte: u8,
        mode: FramingMode,
    ) -> Result<Option<Message>> {
        let port = check_port(port, self.buffers.len())?;
        let buffer = &mut self.buffers[port];

        Ok(buffer.ingest(byte, mode).map(|payload| {
            tracing::trace!(port, size = payload.len(), ?mode, "message framed");
            Message { port, payload }
        }))
    }

    /// Discard bytes buffered for `port`.
    pub fn reset(&mut self, port: usize) -> Result<()> {
        let port = check_port(port, self.buffers.len())?;
        let buffer = &mut self.buffers[port];
        if !buffer.is_empty() {
            tracing::debug!(port, dropped = buffer.len(), "receive buffer discarded");
        }
        buffer.clear();
        Ok(())
    }

    /// Number of bytes buffered for `port`.
    pub fn pending(&self, port: usize) -> Result<usize> {
        let port = check_port(port, self.buffers.len())?;
        Ok(self.buffers[port].len())
    }

    /// Number of ports, console included.
    pub fn port_count(&self) -> usize {
        self.buffers.len()
    }

    /// Current framing configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
