//! MQTT message bus built on the `rumqttc` synchronous client.
//!
//! The client's network event loop runs on a dedicated thread. That thread
//! never touches bridge state: it forwards inbound publishes into a bounded
//! queue and tracks whether the broker session is up. The bridge drains the
//! queue through [`MessageBus::try_recv`] on its own poll loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS};

use crate::error::{Result, TransportError};
use crate::traits::{InboundMessage, MessageBus};

/// Default broker port.
pub const DEFAULT_PORT: u16 = 1883;

/// Default wait between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname or address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Username for authentication (optional).
    pub username: Option<String>,
    /// Password for authentication (optional, requires a username).
    pub password: Option<String>,
    /// Keep-alive interval negotiated with the broker.
    pub keep_alive: Duration,
    /// Wait between reconnection attempts after a connection error.
    pub reconnect_delay: Duration,
    /// Inbound messages buffered before new ones are dropped.
    pub inbound_capacity: usize,
    /// Outgoing requests buffered inside the client.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            client_id: "multilog".to_string(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(30),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            inbound_capacity: 64,
            request_capacity: 64,
        }
    }
}

impl MqttConfig {
    fn to_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let Some(username) = &self.username {
            options.set_credentials(
                username.clone(),
                self.password.clone().unwrap_or_default(),
            );
        }
        options
    }
}

/// A [`MessageBus`] backed by an MQTT broker.
pub struct MqttBus {
    client: Client,
    inbound: Receiver<InboundMessage>,
    connected: Arc<AtomicBool>,
    stopping: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MqttBus {
    /// Start the client and its network thread. Connection happens in the
    /// background; poll [`MessageBus::is_connected`] to observe it.
    pub fn start(config: &MqttConfig) -> Result<Self> {
        let (client, connection) = Client::new(config.to_options(), config.request_capacity);
        let (tx, rx) = mpsc::sync_channel(config.inbound_capacity.max(1));
        let connected = Arc::new(AtomicBool::new(false));
        let stopping = Arc::new(AtomicBool::new(false));

        let worker = {
            let connected = Arc::clone(&connected);
            let stopping = Arc::clone(&stopping);
            let reconnect_delay = config.reconnect_delay;
            std::thread::Builder::new()
                .name("multilog-mqtt".to_string())
                .spawn(move || {
                    run_event_loop(connection, tx, &connected, &stopping, reconnect_delay)
                })?
        };

        tracing::info!(
            host = %config.host,
            port = config.port,
            client_id = %config.client_id,
            "mqtt client started"
        );

        Ok(Self {
            client,
            inbound: rx,
            connected,
            stopping,
            worker: Some(worker),
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.stopping.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }
}

fn run_event_loop(
    mut connection: Connection,
    tx: SyncSender<InboundMessage>,
    connected: &AtomicBool,
    stopping: &AtomicBool,
    reconnect_delay: Duration,
) {
    for notification in connection.iter() {
        if stopping.load(Ordering::SeqCst) {
            break;
        }

        match notification {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                let accepted = ack.code == ConnectReturnCode::Success;
                connected.store(accepted, Ordering::SeqCst);
                if accepted {
                    tracing::info!("mqtt connected");
                } else {
                    tracing::warn!(code = ?ack.code, "mqtt connection refused");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage::new(publish.topic, publish.payload);
                match tx.try_send(message) {
                    Ok(()) => {}
                    Err(TrySendError::Full(dropped)) => {
                        tracing::warn!(topic = %dropped.topic, "inbound queue full, message dropped");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                connected.store(false, Ordering::SeqCst);
                tracing::warn!("mqtt broker closed the session");
            }
            Ok(_) => {}
            Err(err) => {
                connected.store(false, Ordering::SeqCst);
                if stopping.load(Ordering::SeqCst) {
                    break;
                }
                tracing::warn!(error = %err, "mqtt connection error, retrying");
                std::thread::sleep(reconnect_delay);
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
    tracing::debug!("mqtt event loop exited");
}

impl MessageBus for MqttBus {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        self.check_open()?;
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.check_open()?;
        self.client.try_subscribe(topic, QoS::AtMostOnce)?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn try_recv(&mut self) -> Option<InboundMessage> {
        self.inbound.try_recv().ok()
    }

    fn disconnect(&mut self) -> Result<()> {
        self.stopping.store(true, Ordering::SeqCst);
        let result = self.client.disconnect();
        self.connected.store(false, Ordering::SeqCst);
        result?;
        Ok(())
    }
}

impl Drop for MqttBus {
    fn drop(&mut self) {
        if !self.stopping.swap(true, Ordering::SeqCst) {
            let _ = self.client.disconnect();
        }
        // The event loop only exits once the client side is gone or the
        // connection errors; don't block process exit on it.
        drop(self.worker.take());
    }
}

impl std::fmt::Debug for MqttBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBus")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_firmware_timing() {
        let cfg = MqttConfig::default();
        assert_eq!(cfg.port, 1883);
        assert_eq!(cfg.reconnect_delay, Duration::from_secs(5));
        assert!(cfg.inbound_capacity > 0);
    }

    #[test]
    fn options_carry_credentials_and_client_id() {
        let cfg = MqttConfig {
            client_id: "MULTILOG_AABBCCDDEEFF".to_string(),
            username: Some("operator".to_string()),
            password: Some("secret".to_string()),
            ..MqttConfig::default()
        };
        let options = cfg.to_options();
        assert_eq!(options.client_id(), "MULTILOG_AABBCCDDEEFF");
        assert_eq!(
            options.credentials(),
            Some(("operator".to_string(), "secret".to_string()))
        );
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
    }
}
