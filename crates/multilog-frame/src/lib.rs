//! Per-port receive framing for the multilog serial bridge.
//!
//! Bytes arrive from a UART one at a time. This crate decides where one
//! forwarded message ends and the next begins:
//! - line mode flushes on `'\n'` (terminator dropped)
//! - raw mode flushes only when the buffer is nearly full
//! - either mode flushes at `capacity - 1` bytes, so memory stays bounded
//!   and unterminated input still makes progress
//!
//! It also owns the port numbering rules shared by the whole bridge: port 0
//! is the device console and is never exposed.

pub mod buffer;
pub mod engine;
pub mod error;
pub mod port;

pub use buffer::{FrameConfig, FramingMode, Message, ReceiveBuffer, DEFAULT_CAPACITY};
pub use engine::FramingEngine;
pub use error::{FrameError, Result};
pub use port::{check_port, is_reserved, CONSOLE_PORT, FIRST_BRIDGED_PORT};
