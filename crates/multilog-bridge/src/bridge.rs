use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bytes::Bytes;
use multilog_command::PortCommand;
use multilog_frame::{check_port, FrameConfig, FrameError, FramingEngine, FramingMode};
use multilog_transport::{MessageBus, SerialLink};

use crate::control::{version_string, ControlRequest, ANNOUNCE_CONNECTED, REPLY_REBOOTING};
use crate::error::{BridgeError, Result};
use crate::identity::DeviceIdentity;
use crate::status::{StatusReporter, DEFAULT_STATUS_INTERVAL};
use crate::store::{PortConfigStore, DEFAULT_BAUD_RATE};
use crate::topics::{Route, TopicSet};

/// Transmit echoes remembered per port while waiting for them to come back.
pub const ECHO_GUARD_DEPTH: usize = 8;

/// Age after which an echo that never came back is forgotten.
pub const ECHO_GUARD_TTL: Duration = Duration::from_secs(2);

/// Bytes read from one port in one cycle, at most.
pub const PORT_READ_BUDGET: usize = 4096;

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub identity: DeviceIdentity,
    /// Line speed every port starts with.
    pub default_baud: u32,
    pub status_interval: Duration,
    pub frame: FrameConfig,
}

impl BridgeConfig {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            default_baud: DEFAULT_BAUD_RATE,
            status_interval: DEFAULT_STATUS_INTERVAL,
            frame: FrameConfig::default(),
        }
    }
}

/// What one [`Bridge::poll_cycle`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Inbound bus messages taken from the queue.
    pub inbound: usize,
    /// Framed serial messages published.
    pub forwarded: usize,
    pub status_published: bool,
    /// A remote reboot was requested; the caller should stop and restart.
    pub reboot_requested: bool,
}

/// Outcome of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// A port configuration command was applied.
    Configured { port: usize, command: PortCommand },
    /// Bytes were written to a port and echoed.
    Transmitted { port: usize, bytes: usize },
    /// The message was the bus echo of an earlier transmit.
    EchoSuppressed { port: usize },
    Control(ControlRequest),
    /// Topic or control keyword not recognized.
    Ignored,
}

/// Bridges serial ports to a message bus.
///
/// Port 0 is the console and is never bridged; `links[i]` drives port
/// `i + 1`. Everything happens on the caller's thread inside
/// [`poll_cycle`](Bridge::poll_cycle), which never blocks.
pub struct Bridge<S, B> {
    config: BridgeConfig,
    topics: TopicSet,
    store: PortConfigStore,
    framer: FramingEngine,
    reporter: StatusReporter,
    // Index 0 (console) is always `None`.
    links: Vec<Option<S>>,
    echo_guard: Vec<VecDeque<(Instant, Bytes)>>,
    bus: B,
    session_ready: bool,
    // Time of the latest cycle.
    clock: Instant,
}

impl<S: SerialLink, B: MessageBus> Bridge<S, B> {
    /// Create a bridge over `links` (ports 1..=links.len()) and `bus`.
    pub fn new(config: BridgeConfig, bus: B, links: Vec<S>) -> Result<Self> {
        let port_count = links.len() + 1;
        let framer = FramingEngine::with_config(port_count, config.frame)?;
        let topics = TopicSet::new(config.identity.uuid(), port_count);
        let store = PortConfigStore::with_default_baud(port_count, config.default_baud);
        let reporter = StatusReporter::new(config.status_interval);

        let links: Vec<Option<S>> = std::iter::once(None)
            .chain(links.into_iter().map(Some))
            .collect();

        tracing::info!(
            device = config.identity.uuid(),
            ports = port_count,
            default_baud = config.default_baud,
            "bridge initialized"
        );

        Ok(Self {
            config,
            topics,
            store,
            framer,
            reporter,
            links,
            echo_guard: vec![VecDeque::new(); port_count],
            bus,
            session_ready: false,
            clock: Instant::now(),
        })
    }

    /// Run one cooperative cycle at time `now`.
    ///
    /// In order: keep the bus session subscribed, handle every queued
    /// inbound message, drain every enabled port, then give the status
    /// reporter a chance to publish. Failures are logged and never stop the
    /// cycle. When a reboot is requested the cycle returns right away.
    pub fn poll_cycle(&mut self, now: Instant) -> CycleReport {
        let mut report = CycleReport::default();
        self.clock = now;

        self.maintain_session();

        while let Some(message) = self.bus.try_recv() {
            report.inbound += 1;
            match self.handle_message(&message.topic, &message.payload) {
                Ok(Handled::Control(ControlRequest::Reboot)) => {
                    report.reboot_requested = true;
                    return report;
                }
                Ok(handled) => {
                    tracing::trace!(topic = %message.topic, ?handled, "inbound message handled");
                }
                Err(err) => {
                    tracing::debug!(topic = %message.topic, error = %err, "inbound message dropped");
                }
            }
        }

        for port in self.store.reportable_ports() {
            report.forwarded += self.service_port(port);
        }

        if let Some(status) = self.reporter.tick(now, &self.store) {
            match status.to_payload() {
                Ok(payload) => {
                    report.status_published =
                        publish_logged(&mut self.bus, self.topics.status(), &payload);
                }
                Err(err) => tracing::warn!(error = %err, "failed to encode status report"),
            }
        }

        report
    }

    /// Handle one inbound bus message.
    ///
    /// Errors describe why the message was rejected; no state changes when
    /// one is returned.
    pub fn handle_message(&mut self, topic: &str, payload: &[u8]) -> Result<Handled> {
        match self.topics.route(topic) {
            Some(Route::Control) => Ok(self.handle_control(payload)),
            Some(Route::Config(port)) => self.configure(port, payload),
            Some(Route::Transmit(port)) => self.transmit(port, payload),
            None => Ok(Handled::Ignored),
        }
    }

    fn maintain_session(&mut self) {
        if !self.bus.is_connected() {
            if self.session_ready {
                tracing::warn!("bus session lost");
                self.session_ready = false;
                // Echoes in flight died with the session.
                self.echo_guard.iter_mut().for_each(VecDeque::clear);
            }
            return;
        }
        if self.session_ready {
            return;
        }

        publish_logged(
            &mut self.bus,
            self.topics.control_out(),
            ANNOUNCE_CONNECTED.as_bytes(),
        );
        let mut subscribed = 0usize;
        for topic in self.topics.subscriptions() {
            match self.bus.subscribe(topic) {
                Ok(()) => subscribed += 1,
                Err(err) => tracing::warn!(topic, error = %err, "subscribe failed"),
            }
        }
        tracing::info!(subscriptions = subscribed, "bus session ready");
        self.session_ready = true;
    }

    fn handle_control(&mut self, payload: &[u8]) -> Handled {
        let Some(request) = ControlRequest::parse(payload) else {
            tracing::debug!(size = payload.len(), "unknown control request");
            return Handled::Ignored;
        };
        let reply = match request {
            ControlRequest::Reboot => {
                tracing::warn!("reboot requested");
                REPLY_REBOOTING.to_string()
            }
            ControlRequest::Version => version_string(),
        };
        publish_logged(&mut self.bus, self.topics.control_out(), reply.as_bytes());
        Handled::Control(request)
    }

    fn configure(&mut self, port: usize, payload: &[u8]) -> Result<Handled> {
        let port = check_port(port, self.store.port_count())?;
        let command = PortCommand::parse(payload)?;

        match command {
            PortCommand::Enable => {
                if !self.store.is_enabled(port) {
                    self.discard_stale_input(port);
                }
                self.store.set_enabled(port, true)?;
            }
            PortCommand::Disable => {
                self.store.set_enabled(port, false)?;
                self.framer.reset(port)?;
            }
            PortCommand::Bauds(baud_rate) => {
                self.store.set_baud(port, baud_rate)?;
                if let Some(link) = self.links.get_mut(port).and_then(Option::as_mut) {
                    if let Err(err) = link.set_baud_rate(baud_rate) {
                        tracing::warn!(port, baud_rate, error = %err, "failed to apply line speed");
                    }
                }
            }
            PortCommand::Mode(mode) => {
                self.store.set_raw_mode(port, mode == FramingMode::Raw)?;
            }
        }

        tracing::info!(port, ?command, "port configured");
        Ok(Handled::Configured { port, command })
    }

    fn transmit(&mut self, port: usize, payload: &[u8]) -> Result<Handled> {
        let port = check_port(port, self.store.port_count())?;

        let clock = self.clock;
        let guard = &mut self.echo_guard[port];
        guard.retain(|(sent_at, _)| clock.saturating_duration_since(*sent_at) < ECHO_GUARD_TTL);
        if let Some(pos) = guard.iter().position(|(_, sent)| sent.as_ref() == payload) {
            // Older entries never came back; forget them too.
            guard.drain(..=pos);
            tracing::trace!(port, "transmit echo suppressed");
            return Ok(Handled::EchoSuppressed { port });
        }

        if !self.store.is_enabled(port) {
            return Err(BridgeError::PortDisabled(port));
        }
        let link = self
            .links
            .get_mut(port)
            .and_then(Option::as_mut)
            .ok_or(FrameError::RejectedPort(port))?;
        let max = self.config.frame.max_message_len();
        if payload.len() > max {
            tracing::debug!(port, size = payload.len(), max, "transmit payload truncated");
        }
        let payload = &payload[..payload.len().min(max)];
        link.write(payload)?;
        tracing::debug!(port, size = payload.len(), "transmitted");

        let tx = self
            .topics
            .port(port)
            .map(|topics| topics.tx.as_str())
            .unwrap_or_default();
        if publish_logged(&mut self.bus, tx, payload) {
            let guard = &mut self.echo_guard[port];
            guard.push_back((clock, Bytes::copy_from_slice(payload)));
            if guard.len() > ECHO_GUARD_DEPTH {
                guard.pop_front();
            }
        }

        Ok(Handled::Transmitted {
            port,
            bytes: payload.len(),
        })
    }

    /// Forward the complete messages available on `port`, reading at most
    /// [`PORT_READ_BUDGET`] bytes.
    fn service_port(&mut self, port: usize) -> usize {
        let Some(config) = self.store.get(port).ok().filter(|cfg| cfg.enabled) else {
            return 0;
        };
        let mode = config.framing_mode();
        let Some(link) = self.links.get_mut(port).and_then(Option::as_mut) else {
            return 0;
        };

        let mut forwarded = 0;
        for _ in 0..PORT_READ_BUDGET {
            match link.available() {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    tracing::warn!(port, error = %err, "serial poll failed");
                    break;
                }
            }
            let byte = match link.read_byte() {
                Ok(byte) => byte,
                Err(err) => {
                    tracing::warn!(port, error = %err, "serial read failed");
                    break;
                }
            };
            match self.framer.ingest_byte(port, byte, mode) {
                Ok(Some(message)) => {
                    let Some(topics) = self.topics.port(port) else {
                        break;
                    };
                    if publish_logged(&mut self.bus, &topics.rx, &message.payload) {
                        forwarded += 1;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(port, error = %err, "framing rejected byte");
                    break;
                }
            }
        }
        forwarded
    }

    /// Drop bytes that arrived while `port` was disabled, up to
    /// [`PORT_READ_BUDGET`].
    fn discard_stale_input(&mut self, port: usize) {
        let Some(link) = self.links.get_mut(port).and_then(Option::as_mut) else {
            return;
        };
        let mut dropped = 0usize;
        while dropped < PORT_READ_BUDGET && matches!(link.available(), Ok(true)) {
            if link.read_byte().is_err() {
                break;
            }
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(port, dropped, "stale serial input discarded");
        }
    }

    /// Disconnect from the bus.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.bus.disconnect() {
            tracing::warn!(error = %err, "bus disconnect failed");
        }
        self.session_ready = false;
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    pub fn store(&self) -> &PortConfigStore {
        &self.store
    }

    pub fn framer(&self) -> &FramingEngine {
        &self.framer
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Number of ports, console included.
    pub fn port_count(&self) -> usize {
        self.store.port_count()
    }

    /// Whether the announcement and subscriptions for the current bus
    /// session have been made.
    pub fn session_ready(&self) -> bool {
        self.session_ready
    }
}

fn publish_logged<B: MessageBus>(bus: &mut B, topic: &str, payload: &[u8]) -> bool {
    match bus.publish(topic, payload) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(topic, size = payload.len(), error = %err, "publish failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use multilog_command::CommandError;
    use multilog_transport::{MemoryBus, MemorySerial};

    use super::*;

    const DEV: &str = "DEV";

    struct Harness {
        bridge: Bridge<MemorySerial, MemoryBus>,
        bus: MemoryBus,
        serials: Vec<MemorySerial>,
        t0: Instant,
    }

    impl Harness {
        /// Connected bridge with `bridged` ports, first cycle already run.
        fn new(bridged: usize) -> Self {
            let bus = MemoryBus::connected();
            let serials: Vec<MemorySerial> = (0..bridged).map(|_| MemorySerial::new()).collect();
            let config = BridgeConfig::new(DeviceIdentity::new(DEV).unwrap());
            let bridge = Bridge::new(config, bus.clone(), serials.clone()).unwrap();
            let mut harness = Self {
                bridge,
                bus,
                serials,
                t0: Instant::now(),
            };
            harness.cycle();
            harness.bus.take_published();
            harness
        }

        fn cycle(&mut self) -> CycleReport {
            self.bridge.poll_cycle(self.t0)
        }

        fn send(&mut self, topic: &str, payload: &str) -> CycleReport {
            self.bus.inject(topic, payload.as_bytes());
            self.cycle()
        }

        fn serial(&self, port: usize) -> &MemorySerial {
            &self.serials[port - 1]
        }
    }

    fn topic(suffix: &str) -> String {
        format!("/{DEV}/{suffix}")
    }

    #[test]
    fn connect_announces_and_subscribes() {
        let bus = MemoryBus::connected();
        let config = BridgeConfig::new(DeviceIdentity::new(DEV).unwrap());
        let mut bridge =
            Bridge::new(config, bus.clone(), vec![MemorySerial::new(), MemorySerial::new()])
                .unwrap();
        assert_eq!(bridge.port_count(), 3);

        bridge.poll_cycle(Instant::now());
        assert!(bridge.session_ready());
        assert_eq!(
            bus.published_on(&topic("control/out")),
            vec![Bytes::from_static(b"Device connected")]
        );
        assert_eq!(
            bus.subscriptions(),
            vec![
                topic("control/in"),
                topic("uart/1/cfg"),
                topic("uart/1/tx"),
                topic("uart/2/cfg"),
                topic("uart/2/tx"),
            ]
        );

        // No second announcement while the session lasts.
        bridge.poll_cycle(Instant::now());
        assert_eq!(bus.published_on(&topic("control/out")).len(), 1);
    }

    #[test]
    fn reconnect_announces_again() {
        let mut h = Harness::new(1);
        h.bus.set_connected(false);
        h.cycle();
        assert!(!h.bridge.session_ready());
        assert!(h.bus.subscriptions().is_empty());

        h.bus.set_connected(true);
        h.cycle();
        assert!(h.bridge.session_ready());
        assert_eq!(h.bus.published_on(&topic("control/out")).len(), 1);
        assert_eq!(h.bus.subscriptions().len(), 3);
    }

    #[test]
    fn disconnected_bus_is_not_fatal() {
        let bus = MemoryBus::new();
        let serial = MemorySerial::new();
        let config = BridgeConfig::new(DeviceIdentity::new(DEV).unwrap());
        let mut bridge = Bridge::new(config, bus.clone(), vec![serial.clone()]).unwrap();

        bridge.poll_cycle(Instant::now());
        assert!(!bridge.session_ready());
        assert!(bus.take_published().is_empty());
    }

    #[test]
    fn enable_then_forward_line() {
        let mut h = Harness::new(2);
        let report = h.send(&topic("uart/1/cfg"), "enable");
        assert_eq!(report.inbound, 1);
        assert!(h.bridge.store().is_enabled(1));

        h.serial(1).push_rx(b"hello\n");
        let report = h.cycle();
        assert_eq!(report.forwarded, 1);
        assert_eq!(
            h.bus.published_on(&topic("uart/1/rx")),
            vec![Bytes::from_static(b"hello")]
        );
        assert!(h.bus.published_on(&topic("uart/1/tx")).is_empty());
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");

        h.serial(1).push_rx(b"hel");
        assert_eq!(h.cycle().forwarded, 0);
        assert_eq!(h.bridge.framer().pending(1), Ok(3));

        h.serial(1).push_rx(b"lo\r\n");
        assert_eq!(h.cycle().forwarded, 1);
        assert_eq!(
            h.bus.published_on(&topic("uart/1/rx")),
            vec![Bytes::from_static(b"hello\r")]
        );
    }

    #[test]
    fn raw_mode_forwards_full_chunks() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        h.send(&topic("uart/1/cfg"), "mode raw");
        assert!(h.bridge.store().get(1).unwrap().raw_byte_mode);

        let max = FrameConfig::default().max_message_len();
        let mut input = vec![b'\n'; max];
        input.extend_from_slice(b"ab");
        h.serial(1).push_rx(&input);
        assert_eq!(h.cycle().forwarded, 1);
        assert_eq!(
            h.bus.published_on(&topic("uart/1/rx")),
            vec![Bytes::from(vec![b'\n'; max])]
        );
        assert_eq!(h.bridge.framer().pending(1), Ok(2));
    }

    #[test]
    fn long_line_is_split_at_capacity() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");

        let max = FrameConfig::default().max_message_len();
        h.serial(1).push_rx(&vec![b'x'; max + 3]);
        assert_eq!(h.cycle().forwarded, 1);
        let published = h.bus.published_on(&topic("uart/1/rx"));
        assert_eq!(published[0].len(), max);
        assert_eq!(h.bridge.framer().pending(1), Ok(3));
    }

    #[test]
    fn disabled_ports_are_skipped() {
        let mut h = Harness::new(2);
        h.send(&topic("uart/2/cfg"), "enable");
        h.serial(1).push_rx(b"ignored\n");
        h.serial(2).push_rx(b"kept\n");

        let report = h.cycle();
        assert_eq!(report.forwarded, 1);
        assert!(h.bus.published_on(&topic("uart/1/rx")).is_empty());
        assert_eq!(h.serial(1).pending_rx(), 8);
    }

    #[test]
    fn enabling_discards_input_received_while_disabled() {
        let mut h = Harness::new(1);
        h.serial(1).push_rx(b"stale\n");
        h.send(&topic("uart/1/cfg"), "enable");
        assert_eq!(h.serial(1).pending_rx(), 0);

        h.serial(1).push_rx(b"fresh\n");
        h.cycle();
        assert_eq!(
            h.bus.published_on(&topic("uart/1/rx")),
            vec![Bytes::from_static(b"fresh")]
        );
    }

    #[test]
    fn disable_clears_partial_message() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        h.serial(1).push_rx(b"partial");
        h.cycle();
        assert_eq!(h.bridge.framer().pending(1), Ok(7));

        h.send(&topic("uart/1/cfg"), "disable");
        assert!(!h.bridge.store().is_enabled(1));
        assert_eq!(h.bridge.framer().pending(1), Ok(0));
    }

    #[test]
    fn bauds_updates_store_and_link() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "bauds 9600");
        assert_eq!(h.bridge.store().get(1).unwrap().baud_rate, 9600);
        assert_eq!(h.serial(1).baud_rate(), Some(9600));
    }

    #[test]
    fn invalid_bauds_leaves_store_unchanged() {
        let mut h = Harness::new(1);
        let err = h
            .bridge
            .handle_message(&topic("uart/1/cfg"), b"bauds 96x0")
            .unwrap_err();
        assert!(matches!(err, BridgeError::Command(CommandError::BadInput(_))));
        assert_eq!(
            h.bridge.store().get(1).unwrap().baud_rate,
            DEFAULT_BAUD_RATE
        );
        assert_eq!(h.serial(1).baud_rate(), None);
    }

    #[test]
    fn bauds_touches_only_the_addressed_port() {
        let mut h = Harness::new(2);
        h.send(&topic("uart/2/cfg"), "bauds 9600");
        let cfg = h.bridge.store().get(2).unwrap();
        assert_eq!(cfg.baud_rate, 9600);
        assert!(!cfg.enabled);
        assert!(!cfg.raw_byte_mode);
        assert_eq!(h.bridge.store().get(1).unwrap().baud_rate, DEFAULT_BAUD_RATE);

        h.send(&topic("uart/2/cfg"), "bauds abc");
        assert_eq!(h.bridge.store().get(2).unwrap().baud_rate, 9600);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut h = Harness::new(1);
        let err = h
            .bridge
            .handle_message(&topic("uart/1/cfg"), b"frobnicate")
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Command(CommandError::UnknownCommand(_))
        ));
        assert!(!h.bridge.store().is_enabled(1));
    }

    #[test]
    fn console_port_is_never_configured_or_written() {
        let mut h = Harness::new(1);
        let err = h
            .bridge
            .handle_message(&topic("uart/0/cfg"), b"enable")
            .unwrap_err();
        assert!(matches!(err, BridgeError::Port(FrameError::RejectedPort(0))));
        assert!(!h.bridge.store().get(0).unwrap().enabled);

        let err = h
            .bridge
            .handle_message(&topic("uart/0/tx"), b"data")
            .unwrap_err();
        assert!(matches!(err, BridgeError::Port(FrameError::RejectedPort(0))));
        assert!(h.bus.take_published().is_empty());
    }

    #[test]
    fn transmit_writes_and_echoes() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");

        let handled = h
            .bridge
            .handle_message(&topic("uart/1/tx"), b"AT\r\n")
            .unwrap();
        assert_eq!(handled, Handled::Transmitted { port: 1, bytes: 4 });
        assert_eq!(h.serial(1).take_tx(), b"AT\r\n");
        assert_eq!(
            h.bus.published_on(&topic("uart/1/tx")),
            vec![Bytes::from_static(b"AT\r\n")]
        );
    }

    #[test]
    fn transmit_echo_is_not_written_twice() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        h.send(&topic("uart/1/tx"), "ping");
        assert_eq!(h.serial(1).take_tx(), b"ping");

        // The bus delivers our own echo back on the subscribed topic.
        let echo = h.bus.published_on(&topic("uart/1/tx"));
        assert_eq!(echo.len(), 1);
        let handled = h
            .bridge
            .handle_message(&topic("uart/1/tx"), &echo[0])
            .unwrap();
        assert_eq!(handled, Handled::EchoSuppressed { port: 1 });
        assert!(h.serial(1).take_tx().is_empty());
        assert_eq!(h.bus.published_on(&topic("uart/1/tx")).len(), 1);

        // The same text sent again by an operator goes out.
        h.send(&topic("uart/1/tx"), "ping");
        assert_eq!(h.serial(1).take_tx(), b"ping");
    }

    #[test]
    fn echo_guard_is_bounded() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        for i in 0..ECHO_GUARD_DEPTH + 2 {
            h.bridge
                .handle_message(&topic("uart/1/tx"), format!("m{i}").as_bytes())
                .unwrap();
        }
        // The oldest entries were evicted, so "m0" is a fresh transmit.
        let handled = h.bridge.handle_message(&topic("uart/1/tx"), b"m0").unwrap();
        assert_eq!(handled, Handled::Transmitted { port: 1, bytes: 2 });
    }

    #[test]
    fn lost_echo_is_forgotten_after_reconnect() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        h.send(&topic("uart/1/tx"), "AT");
        assert_eq!(h.serial(1).take_tx(), b"AT");

        // The echo is lost with the session.
        h.bus.set_connected(false);
        h.cycle();
        h.bus.set_connected(true);
        h.cycle();

        let handled = h.bridge.handle_message(&topic("uart/1/tx"), b"AT").unwrap();
        assert_eq!(handled, Handled::Transmitted { port: 1, bytes: 2 });
        assert_eq!(h.serial(1).take_tx(), b"AT");
    }

    #[test]
    fn lost_echo_expires() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        h.send(&topic("uart/1/tx"), "AT");
        assert_eq!(h.serial(1).take_tx(), b"AT");

        // Within the window a matching payload is still taken as the echo.
        h.bridge.poll_cycle(h.t0 + ECHO_GUARD_TTL / 2);
        h.bus.inject(&topic("uart/1/tx"), b"AT");
        h.bridge.poll_cycle(h.t0 + ECHO_GUARD_TTL / 2);
        assert!(h.serial(1).take_tx().is_empty());

        h.send(&topic("uart/1/tx"), "AT");
        assert_eq!(h.serial(1).take_tx(), b"AT");

        // The echo never arrives; the operator repeats the command later.
        h.bridge.poll_cycle(h.t0 + ECHO_GUARD_TTL);
        let handled = h.bridge.handle_message(&topic("uart/1/tx"), b"AT").unwrap();
        assert_eq!(handled, Handled::Transmitted { port: 1, bytes: 2 });
        assert_eq!(h.serial(1).take_tx(), b"AT");
    }

    #[test]
    fn oversized_transmit_is_truncated() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");

        let max = FrameConfig::default().max_message_len();
        let payload = vec![b'x'; max + 10];
        let handled = h.bridge.handle_message(&topic("uart/1/tx"), &payload).unwrap();
        assert_eq!(handled, Handled::Transmitted { port: 1, bytes: max });
        assert_eq!(h.serial(1).take_tx(), vec![b'x'; max]);
        assert_eq!(
            h.bus.published_on(&topic("uart/1/tx")),
            vec![Bytes::from(vec![b'x'; max])]
        );
    }

    #[test]
    fn serial_reads_are_bounded_per_cycle() {
        let mut h = Harness::new(1);
        h.serial(1).push_rx(&vec![b'x'; PORT_READ_BUDGET + 100]);
        h.bridge
            .handle_message(&topic("uart/1/cfg"), b"enable")
            .unwrap();
        assert_eq!(h.serial(1).pending_rx(), 100);

        h.serial(1).push_rx(&vec![b'y'; PORT_READ_BUDGET]);
        h.cycle();
        assert_eq!(h.serial(1).pending_rx(), 100);
    }

    #[test]
    fn transmit_on_disabled_port_is_dropped() {
        let mut h = Harness::new(1);
        let err = h
            .bridge
            .handle_message(&topic("uart/1/tx"), b"data")
            .unwrap_err();
        assert!(matches!(err, BridgeError::PortDisabled(1)));
        assert!(h.serial(1).take_tx().is_empty());
        assert!(h.bus.take_published().is_empty());
    }

    #[test]
    fn failed_serial_write_is_not_echoed() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        h.serial(1).set_fail_writes(true);
        let err = h
            .bridge
            .handle_message(&topic("uart/1/tx"), b"data")
            .unwrap_err();
        assert!(matches!(err, BridgeError::Transport(_)));
        assert!(h.bus.published_on(&topic("uart/1/tx")).is_empty());
    }

    #[test]
    fn version_request_is_answered() {
        let mut h = Harness::new(1);
        h.send(&topic("control/in"), "version");
        assert_eq!(
            h.bus.published_on(&topic("control/out")),
            vec![Bytes::from(version_string())]
        );
    }

    #[test]
    fn reboot_request_ends_the_cycle() {
        let mut h = Harness::new(1);
        h.send(&topic("uart/1/cfg"), "enable");
        h.bus.inject(&topic("control/in"), b"reboot");
        h.bus.inject(&topic("uart/1/cfg"), b"disable");

        let report = h.cycle();
        assert!(report.reboot_requested);
        assert_eq!(report.inbound, 1);
        assert_eq!(
            h.bus.published_on(&topic("control/out")),
            vec![Bytes::from_static(b"Rebooting")]
        );
        // Requests after the reboot stay queued.
        assert!(h.bridge.store().is_enabled(1));
    }

    #[test]
    fn unknown_control_and_topics_are_ignored() {
        let mut h = Harness::new(1);
        assert_eq!(
            h.bridge.handle_message(&topic("control/in"), b"selfdestruct").unwrap(),
            Handled::Ignored
        );
        assert_eq!(
            h.bridge.handle_message("/elsewhere", b"enable").unwrap(),
            Handled::Ignored
        );
        assert!(h.bus.take_published().is_empty());
    }

    #[test]
    fn status_reports_round_robin() {
        let mut h = Harness::new(2);
        h.send(&topic("uart/2/cfg"), "enable");
        let second = Duration::from_secs(1);

        assert!(!h.bridge.poll_cycle(h.t0 + second / 2).status_published);
        assert!(h.bridge.poll_cycle(h.t0 + second).status_published);
        assert!(h.bridge.poll_cycle(h.t0 + second * 2).status_published);
        assert_eq!(
            h.bus.published_on(&topic("status/uart")),
            vec![
                Bytes::from_static(br#"{"port":1,"enable":0,"bauds":115200}"#),
                Bytes::from_static(br#"{"port":2,"enable":1,"bauds":115200}"#),
            ]
        );
    }

    #[test]
    fn status_cursor_advances_while_offline() {
        let mut h = Harness::new(2);
        let second = Duration::from_secs(1);
        h.bus.set_connected(false);
        assert!(!h.bridge.poll_cycle(h.t0 + second).status_published);

        h.bus.set_connected(true);
        h.bridge.poll_cycle(h.t0 + second * 2);
        let status = h.bus.published_on(&topic("status/uart"));
        assert_eq!(
            status,
            vec![Bytes::from_static(br#"{"port":2,"enable":0,"bauds":115200}"#)]
        );
    }

    #[test]
    fn console_only_device_runs() {
        let bus = MemoryBus::connected();
        let config = BridgeConfig::new(DeviceIdentity::new(DEV).unwrap());
        let mut bridge: Bridge<MemorySerial, MemoryBus> =
            Bridge::new(config, bus.clone(), Vec::new()).unwrap();
        let t0 = Instant::now();
        bridge.poll_cycle(t0);
        let report = bridge.poll_cycle(t0 + Duration::from_secs(5));
        assert!(!report.status_published);
        assert_eq!(bus.subscriptions(), vec![topic("control/in")]);
    }

    #[test]
    fn invalid_frame_config_is_rejected() {
        let mut config = BridgeConfig::new(DeviceIdentity::new(DEV).unwrap());
        config.frame = FrameConfig { capacity: 1 };
        let result = Bridge::new(config, MemoryBus::new(), vec![MemorySerial::new()]);
        assert!(matches!(
            result,
            Err(BridgeError::Port(FrameError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn shutdown_disconnects_bus() {
        let mut h = Harness::new(1);
        h.bridge.shutdown();
        assert_eq!(h.bus.disconnect_count(), 1);
        assert!(!h.bus.is_connected());
    }
}
