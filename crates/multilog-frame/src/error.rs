/// Errors that can occur while addressing ports or configuring framing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The port index is outside the configured range.
    #[error("invalid port {port} (device has {count} ports)")]
    InvalidPort { port: usize, count: usize },

    /// The port is reserved for the device console.
    #[error("port {0} is reserved for the device console")]
    RejectedPort(usize),

    /// The framing configuration cannot be used.
    #[error("invalid framing configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
