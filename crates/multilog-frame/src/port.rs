//! Port numbering.
//!
//! Port 0 is the device console and never takes part in bridging.
//! Ports `1..count` are available for remote configuration, transmission
//! and status reporting.

use crate::error::{FrameError, Result};

/// The local control console. Every bridge entry point rejects it.
pub const CONSOLE_PORT: usize = 0;

/// First port that may be bridged.
pub const FIRST_BRIDGED_PORT: usize = 1;

/// Returns true if the port is reserved for the console.
pub fn is_reserved(port: usize) -> bool {
    port == CONSOLE_PORT
}

/// Validate a port index against a device with `count` ports.
///
/// The console check runs first, so port 0 is always `RejectedPort`, even
/// on a device that has no ports at all.
pub fn check_port(port: usize, count: usize) -> Result<usize> {
    if is_reserved(port) {
        return Err(FrameError::RejectedPort(port));
    }
    if port >= count {
        return Err(FrameError::InvalidPort { port, count });
    }
    Ok(port)
}
