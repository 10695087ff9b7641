/// Errors that can occur on a serial link or on the message bus.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The message bus is not connected to its broker.
    #[error("message bus not connected")]
    NotConnected,

    /// Failed to open the serial device at the given path.
    #[cfg(feature = "serial")]
    #[error("failed to open serial device {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// The serial driver reported an error.
    #[cfg(feature = "serial")]
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// The MQTT client rejected a request.
    #[cfg(feature = "mqtt")]
    #[error("mqtt client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// An I/O error occurred on the link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link has been closed.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
