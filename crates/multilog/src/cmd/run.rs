use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use multilog_bridge::{Bridge, BridgeConfig, DeviceIdentity, RunConfig, RunOutcome};
use multilog_transport::{HardwareSerial, MqttBus, MqttConfig};

use crate::cmd::{parse_duration, RunArgs};
use crate::exit::{
    bridge_error, transport_error, CliError, CliResult, INTERNAL, RESTART_REQUESTED, SUCCESS,
};

pub fn run(args: RunArgs) -> CliResult<i32> {
    let identity = DeviceIdentity::new(&args.device_uuid)
        .map_err(|err| bridge_error("invalid device identity", err))?;
    let status_interval = parse_duration(&args.status_interval)?;
    let poll_interval = parse_duration(&args.poll_interval)?;
    let reconnect_delay = parse_duration(&args.reconnect_delay)?;

    let mut links: Vec<HardwareSerial> = Vec::with_capacity(args.uarts.len());
    for path in &args.uarts {
        let link = HardwareSerial::open(path, args.default_baud)
            .map_err(|err| transport_error("serial open failed", err))?;
        tracing::info!(port = links.len() + 1, path = %path, "serial port opened");
        links.push(link);
    }

    let mqtt = MqttConfig {
        host: args.broker_host,
        port: args.broker_port,
        client_id: identity.client_id().to_string(),
        username: args.username,
        password: args.password,
        reconnect_delay,
        ..MqttConfig::default()
    };
    let bus =
        MqttBus::start(&mqtt).map_err(|err| transport_error("broker client failed", err))?;

    let mut config = BridgeConfig::new(identity);
    config.default_baud = args.default_baud;
    config.status_interval = status_interval;
    let mut bridge =
        Bridge::new(config, bus, links).map_err(|err| bridge_error("bridge setup failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let outcome = multilog_bridge::run(&mut bridge, &RunConfig { poll_interval }, &running);
    match outcome {
        RunOutcome::Stopped => Ok(SUCCESS),
        RunOutcome::RebootRequested => Ok(RESTART_REQUESTED),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
