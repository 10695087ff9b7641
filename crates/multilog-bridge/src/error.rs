/// Errors that can occur while the bridge handles a request.
///
/// None of these are fatal: the bridge logs them and drops the request.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Serial link or message bus error.
    #[error("transport error: {0}")]
    Transport(#[from] multilog_transport::TransportError),

    /// Port addressing error (console port or out of range).
    #[error("port error: {0}")]
    Port(#[from] multilog_frame::FrameError),

    /// Malformed configuration command.
    #[error("command error: {0}")]
    Command(#[from] multilog_command::CommandError),

    /// The addressed port is not enabled.
    #[error("port {0} is disabled")]
    PortDisabled(usize),

    /// The device identifier cannot be used in topic names.
    #[error("invalid device identity: {0}")]
    InvalidIdentity(String),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
