//! Multi-port serial to publish/subscribe bridge.
//!
//! This is the "just works" layer. Give it serial links and a message bus,
//! call [`Bridge::poll_cycle`] in a loop (or hand it to [`runner::run`]),
//! and remote operators can enable ports, change their speed, send text out
//! of them and watch their traffic and status.

pub mod bridge;
pub mod control;
pub mod error;
pub mod identity;
pub mod runner;
pub mod status;
pub mod store;
pub mod topics;

pub use bridge::{
    Bridge, BridgeConfig, CycleReport, Handled, ECHO_GUARD_DEPTH, ECHO_GUARD_TTL, PORT_READ_BUDGET,
};
pub use control::{
    version_string, ControlRequest, ANNOUNCE_CONNECTED, CONTROL_REBOOT, CONTROL_VERSION,
    REPLY_REBOOTING,
};
pub use error::{BridgeError, Result};
pub use identity::{DeviceIdentity, PROJECT_NAME};
pub use runner::{run, RunConfig, RunOutcome, DEFAULT_POLL_INTERVAL};
pub use status::{StatusReport, StatusReporter, DEFAULT_STATUS_INTERVAL};
pub use store::{PortConfig, PortConfigStore, DEFAULT_BAUD_RATE};
pub use topics::{PortTopics, Route, TopicSet};
