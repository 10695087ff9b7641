//! In-memory serial links and message bus.
//!
//! Both types are cheap cloneable handles over shared state: hand one clone
//! to the bridge and keep another to feed input and inspect output.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::{InboundMessage, MessageBus, SerialLink};

#[derive(Debug, Default)]
struct SerialState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    baud_rate: Option<u32>,
    fail_writes: bool,
}

/// A serial link backed by in-memory queues.
#[derive(Debug, Clone, Default)]
pub struct MemorySerial {
    state: Arc<Mutex<SerialState>>,
}

impl MemorySerial {
    /// Create an idle link with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if they had arrived on the wire.
    pub fn push_rx(&self, bytes: &[u8]) {
        self.lock().rx.extend(bytes.iter().copied());
    }

    /// Number of received bytes not yet read.
    pub fn pending_rx(&self) -> usize {
        self.lock().rx.len()
    }

    /// Take everything written to the link so far.
    pub fn take_tx(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().tx)
    }

    /// Last line speed applied through [`SerialLink::set_baud_rate`].
    pub fn baud_rate(&self) -> Option<u32> {
        self.lock().baud_rate
    }

    /// Make subsequent writes fail with a broken-pipe I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> MutexGuard<'_, SerialState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SerialLink for MemorySerial {
    fn available(&mut self) -> Result<bool> {
        Ok(!self.lock().rx.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.lock().rx.pop_front().ok_or_else(|| {
            TransportError::Io(std::io::Error::from(std::io::ErrorKind::WouldBlock))
        })
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(TransportError::Io(std::io::Error::from(
                std::io::ErrorKind::BrokenPipe,
            )));
        }
        state.tx.extend_from_slice(bytes);
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.lock().baud_rate = Some(baud_rate);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BusState {
    connected: bool,
    inbound: VecDeque<InboundMessage>,
    published: Vec<(String, Bytes)>,
    subscriptions: BTreeSet<String>,
    disconnects: usize,
}

/// A message bus that records publishes and replays injected messages.
///
/// Publishing and subscribing fail with [`TransportError::NotConnected`]
/// while the bus is marked disconnected, mirroring a real broker client.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
}

impl MemoryBus {
    /// Create a disconnected bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus that is already connected.
    pub fn connected() -> Self {
        let bus = Self::new();
        bus.set_connected(true);
        bus
    }

    /// Flip the broker session state. Dropping the session clears
    /// subscriptions, as a clean-session broker would.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.lock();
        state.connected = connected;
        if !connected {
            state.subscriptions.clear();
        }
    }

    /// Queue a message as if the broker had delivered it.
    pub fn inject(&self, topic: &str, payload: &[u8]) {
        self.lock()
            .inbound
            .push_back(InboundMessage::new(topic, Bytes::copy_from_slice(payload)));
    }

    /// Take every `(topic, payload)` published so far.
    pub fn take_published(&self) -> Vec<(String, Bytes)> {
        std::mem::take(&mut self.lock().published)
    }

    /// Payloads published on `topic` so far, without consuming them.
    pub fn published_on(&self, topic: &str) -> Vec<Bytes> {
        self.lock()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Currently subscribed topics.
    pub fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.iter().cloned().collect()
    }

    /// How many times [`MessageBus::disconnect`] was called.
    pub fn disconnect_count(&self) -> usize {
        self.lock().disconnects
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageBus for MemoryBus {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state
            .published
            .push((topic.to_string(), Bytes::copy_from_slice(payload)));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.subscriptions.insert(topic.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn try_recv(&mut self) -> Option<InboundMessage> {
        self.lock().inbound.pop_front()
    }

    fn disconnect(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.disconnects += 1;
        state.connected = false;
        state.subscriptions.clear();
        Ok(())
    }
}
