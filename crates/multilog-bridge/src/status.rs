use std::time::{Duration, Instant};

use multilog_frame::FIRST_BRIDGED_PORT;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{PortConfig, PortConfigStore};

/// Time between two status reports.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(1000);

/// Status of one port as published on the status topic.
///
/// Serializes to `{"port":1,"enable":0,"bauds":115200}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub port: usize,
    pub enable: u8,
    pub bauds: u32,
}

impl StatusReport {
    pub fn new(port: usize, config: &PortConfig) -> Self {
        Self {
            port,
            enable: u8::from(config.enabled),
            bauds: config.baud_rate,
        }
    }

    /// JSON payload.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Periodic round-robin status of the bridged ports.
///
/// One port is reported per interval. The first tick only records a
/// baseline, so the first report comes one interval after startup.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    interval: Duration,
    next_port: usize,
    last_report: Option<Instant>,
}

impl StatusReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_port: FIRST_BRIDGED_PORT,
            last_report: None,
        }
    }

    /// Advance the reporter to `now`.
    ///
    /// Returns the report to publish when an interval has elapsed. The
    /// cursor moves on whether or not the caller manages to publish it.
    pub fn tick(&mut self, now: Instant, store: &PortConfigStore) -> Option<StatusReport> {
        let Some(last) = self.last_report else {
            self.last_report = Some(now);
            return None;
        };
        if now.saturating_duration_since(last) < self.interval {
            return None;
        }
        self.last_report = Some(now);

        let ports = store.reportable_ports();
        if ports.is_empty() {
            return None;
        }
        if !ports.contains(&self.next_port) {
            self.next_port = ports.start;
        }

        let port = self.next_port;
        let report = store.get(port).ok().map(|cfg| StatusReport::new(port, cfg));
        self.next_port = if port + 1 >= ports.end {
            ports.start
        } else {
            port + 1
        };
        report
    }

    /// Port the next report will describe.
    pub fn next_port(&self) -> usize {
        self.next_port
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_INTERVAL)
    }
}
