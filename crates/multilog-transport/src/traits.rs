use bytes::Bytes;

use crate::error::Result;

/// A message delivered by the bus on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Raw message payload.
    pub payload: Bytes,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// One UART channel, accessed without blocking.
///
/// Callers check [`available`](SerialLink::available) before every
/// [`read_byte`](SerialLink::read_byte); implementations may return an error
/// if `read_byte` is called with nothing pending.
pub trait SerialLink {
    /// Whether at least one received byte is waiting to be read.
    fn available(&mut self) -> Result<bool>;

    /// Read exactly one received byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Write all of `bytes` to the wire.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Change the line speed.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;
}

impl<T: SerialLink + ?Sized> SerialLink for Box<T> {
    fn available(&mut self) -> Result<bool> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        (**self).set_baud_rate(baud_rate)
    }
}

/// A publish/subscribe message bus.
///
/// Inbound messages are queued by the implementation and handed out through
/// [`try_recv`](MessageBus::try_recv), so the consumer decides when they are
/// processed.
pub trait MessageBus {
    /// Publish `payload` on `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Subscribe to `topic`.
    fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Whether the bus currently has a live broker session.
    fn is_connected(&self) -> bool;

    /// Take the next queued inbound message, if any.
    fn try_recv(&mut self) -> Option<InboundMessage>;

    /// Close the broker session.
    fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: MessageBus + ?Sized> MessageBus for Box<T> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        (**self).publish(topic, payload)
    }

    fn subscribe(&mut self, topic: &str) -> Result<()> {
        (**self).subscribe(topic)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn try_recv(&mut self) -> Option<InboundMessage> {
        (**self).try_recv()
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }
}
