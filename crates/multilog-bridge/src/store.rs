use std::ops::Range;

use multilog_frame::{check_port, FrameError, FramingMode, FIRST_BRIDGED_PORT};
use serde::{Deserialize, Serialize};

/// Line speed every port starts with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Runtime configuration of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub enabled: bool,
    pub baud_rate: u32,
    pub raw_byte_mode: bool,
}

impl PortConfig {
    /// A disabled, line-framed port at `baud_rate`.
    pub fn new(baud_rate: u32) -> Self {
        Self {
            enabled: false,
            baud_rate,
            raw_byte_mode: false,
        }
    }

    /// Receive framing selected by `raw_byte_mode`.
    pub fn framing_mode(&self) -> FramingMode {
        FramingMode::from_raw_flag(self.raw_byte_mode)
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

/// Configuration of every port of the device, console included.
///
/// All mutations go through [`check_port`], so the console entry keeps its
/// initial values for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct PortConfigStore {
    ports: Vec<PortConfig>,
}

impl PortConfigStore {
    /// `port_count` ports at [`DEFAULT_BAUD_RATE`], all disabled.
    pub fn new(port_count: usize) -> Self {
        Self::with_default_baud(port_count, DEFAULT_BAUD_RATE)
    }

    /// `port_count` ports at `baud_rate`, all disabled.
    pub fn with_default_baud(port_count: usize, baud_rate: u32) -> Self {
        Self {
            ports: vec![PortConfig::new(baud_rate); port_count],
        }
    }

    pub fn set_enabled(&mut self, port: usize, enabled: bool) -> multilog_frame::Result<()> {
        let port = check_port(port, self.ports.len())?;
        self.ports[port].enabled = enabled;
        Ok(())
    }

    /// Record a new line speed. Any value is accepted; applying it to the
    /// link is up to the caller.
    pub fn set_baud(&mut self, port: usize, baud_rate: u32) -> multilog_frame::Result<()> {
        let port = check_port(port, self.ports.len())?;
        self.ports[port].baud_rate = baud_rate;
        Ok(())
    }

    pub fn set_raw_mode(&mut self, port: usize, raw_byte_mode: bool) -> multilog_frame::Result<()> {
        let port = check_port(port, self.ports.len())?;
        self.ports[port].raw_byte_mode = raw_byte_mode;
        Ok(())
    }

    /// Configuration of `port`. Reading the console entry is allowed.
    pub fn get(&self, port: usize) -> multilog_frame::Result<&PortConfig> {
        self.ports.get(port).ok_or(FrameError::InvalidPort {
            port,
            count: self.ports.len(),
        })
    }

    /// Whether `port` is a bridged port that is currently enabled.
    pub fn is_enabled(&self, port: usize) -> bool {
        port >= FIRST_BRIDGED_PORT && self.ports.get(port).is_some_and(|cfg| cfg.enabled)
    }

    /// Number of ports, console included.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Indices of the bridged ports, the ones status reports cycle over.
    pub fn reportable_ports(&self) -> Range<usize> {
        FIRST_BRIDGED_PORT..self.ports.len().max(FIRST_BRIDGED_PORT)
    }
}
