use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

/// Default receive buffer capacity per port, in bytes.
///
/// A buffer flushes once it holds `capacity - 1` bytes, so messages carry
/// at most 256 bytes by default.
pub const DEFAULT_CAPACITY: usize = 257;

/// Line terminator recognised in [`FramingMode::Line`].
pub const LINE_TERMINATOR: u8 = b'\n';

/// How a port's byte stream is cut into messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramingMode {
    /// Flush on `'\n'` or when the buffer is nearly full.
    #[default]
    Line,
    /// Flush only when the buffer is nearly full.
    Raw,
}

impl FramingMode {
    /// Mode for a port's `raw_byte_mode` flag.
    pub fn from_raw_flag(raw_byte_mode: bool) -> Self {
        if raw_byte_mode {
            Self::Raw
        } else {
            Self::Line
        }
    }
}

/// A complete message cut from one port's byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The port the bytes arrived on.
    pub port: usize,
    /// Message bytes (line terminator excluded).
    pub payload: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(port: usize, payload: impl Into<Bytes>) -> Self {
        Self {
            port,
            payload: payload.into(),
        }
    }
}

/// Configuration for receive framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Receive buffer capacity per port. Must be at least 2.
    pub capacity: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl FrameConfig {
    /// Largest payload a single flush can carry.
    pub fn max_message_len(&self) -> usize {
        self.capacity.saturating_sub(1)
    }

    /// Reject capacities that could never hold a byte before flushing.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(FrameError::InvalidConfig(format!(
                "capacity must be at least 2, got {}",
                self.capacity
            )));
        }
        Ok(())
    }
}

/// Fixed-capacity accumulator for one port.
///
/// Holds only bytes that have not been forwarded yet. The length never
/// reaches `capacity`: it is flushed at `capacity - 1`.
#[derive(Debug)]
pub struct ReceiveBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl ReceiveBuffer {
    /// Create an empty buffer. `capacity` should come from a validated
    /// [`FrameConfig`].
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Take one byte; returns the flushed payload when a message completes.
    pub fn ingest(&mut self, byte: u8, mode: FramingMode) -> Option<Bytes> {
        if mode == FramingMode::Line && byte == LINE_TERMINATOR {
            return Some(self.flush());
        }

        self.buf.extend_from_slice(&[byte]);
        if self.buf.len() >= self.capacity.saturating_sub(1) {
            return Some(self.flush());
        }
        None
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop everything buffered without emitting it.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn flush(&mut self) -> Bytes {
        let payload = Bytes::copy_from_slice(&self.buf);
        self.buf.clear();
        payload
    }
}
