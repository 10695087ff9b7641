//! Bridge the UART ports of a device to an MQTT broker.
//!
//! Each serial port gets a set of topics: its received lines are published,
//! text sent to it is written out, and remote operators can enable it,
//! change its speed or switch it to raw byte mode. A reserved console port
//! is never bridged.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial link and message bus traits, in-memory doubles,
//!   `serialport` and MQTT adapters (behind `serial` / `mqtt` features)
//! - [`frame`]: per-port receive buffering and message framing
//! - [`command`]: configuration command tokenizer and strict number parsing
//! - [`bridge`]: the poll-cycle controller, topics, status and control
//!   handling (behind the `bridge` feature, on by default)

/// Re-export transport types.
pub mod transport {
    pub use multilog_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use multilog_frame::*;
}

/// Re-export command types.
pub mod command {
    pub use multilog_command::*;
}

/// Re-export bridge types (requires `bridge` feature).
#[cfg(feature = "bridge")]
pub mod bridge {
    pub use multilog_bridge::*;
}
