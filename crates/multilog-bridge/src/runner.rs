use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use multilog_transport::{MessageBus, SerialLink};

use crate::bridge::Bridge;

/// Pause between two poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub poll_interval: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// `running` was cleared.
    Stopped,
    /// A remote operator asked for a restart.
    RebootRequested,
}

/// Poll `bridge` until `running` is cleared or a reboot is requested.
///
/// The bus is disconnected before returning.
pub fn run<S: SerialLink, B: MessageBus>(
    bridge: &mut Bridge<S, B>,
    config: &RunConfig,
    running: &AtomicBool,
) -> RunOutcome {
    tracing::info!(poll_interval = ?config.poll_interval, "bridge running");

    let mut cycles: u64 = 0;
    let outcome = loop {
        if !running.load(Ordering::SeqCst) {
            break RunOutcome::Stopped;
        }
        let report = bridge.poll_cycle(Instant::now());
        cycles += 1;
        if report.reboot_requested {
            break RunOutcome::RebootRequested;
        }
        thread::sleep(config.poll_interval);
    };

    bridge.shutdown();
    tracing::info!(?outcome, cycles, "bridge stopped");
    outcome
}
