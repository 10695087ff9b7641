//! Collaborator abstractions for the multilog bridge.
//!
//! The bridge talks to two kinds of peers:
//! - serial links (one per UART port), byte at a time and never blocking
//! - a publish/subscribe message bus (MQTT on real deployments)
//!
//! This is the lowest layer of multilog. Everything else builds on top of
//! the [`SerialLink`] and [`MessageBus`] traits provided here. Hardware
//! adapters live behind the `serial` and `mqtt` features; the in-memory
//! implementations in [`memory`] are always available.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "mqtt")]
pub mod mqtt;
#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use memory::{MemoryBus, MemorySerial};
pub use traits::{InboundMessage, MessageBus, SerialLink};

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttBus, MqttConfig};
#[cfg(feature = "serial")]
pub use serial::HardwareSerial;
