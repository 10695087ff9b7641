use std::time::Duration;

use clap::{Args, Subcommand};
use multilog_bridge::DEFAULT_BAUD_RATE;
use multilog_transport::mqtt::DEFAULT_PORT;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod parse;
pub mod run;
pub mod topics;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bridge serial ports to the broker until interrupted.
    Run(RunArgs),
    /// Print the topics a device uses.
    Topics(TopicsArgs),
    /// Tokenize and decode a port configuration command.
    Parse(ParseArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Topics(args) => topics::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Device identifier used as topic root (hardware address or any
    /// topic-safe string).
    #[arg(long, env = "MULTILOG_DEVICE_UUID")]
    pub device_uuid: String,
    /// Broker host name or address.
    #[arg(long, env = "MULTILOG_BROKER_HOST", default_value = "localhost")]
    pub broker_host: String,
    /// Broker TCP port.
    #[arg(long, env = "MULTILOG_BROKER_PORT", default_value_t = DEFAULT_PORT)]
    pub broker_port: u16,
    /// Broker user name.
    #[arg(long, env = "MULTILOG_USERNAME")]
    pub username: Option<String>,
    /// Broker password.
    #[arg(long, env = "MULTILOG_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Serial devices bridged as ports 1, 2, ... (repeat or comma-separate).
    #[arg(
        long = "uart",
        value_name = "DEVICE",
        env = "MULTILOG_UART",
        value_delimiter = ','
    )]
    pub uarts: Vec<String>,
    /// Line speed every port starts with.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub default_baud: u32,
    /// Time between status reports (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub status_interval: String,
    /// Pause between poll cycles (e.g. 5ms).
    #[arg(long, default_value = "5ms")]
    pub poll_interval: String,
    /// Wait before reconnecting to the broker (e.g. 5s).
    #[arg(long, default_value = "5s")]
    pub reconnect_delay: String,
}

#[derive(Args, Debug)]
pub struct TopicsArgs {
    /// Device identifier used as topic root.
    #[arg(long, env = "MULTILOG_DEVICE_UUID")]
    pub device_uuid: String,
    /// Number of bridged serial ports.
    #[arg(long, default_value_t = 1)]
    pub ports: usize,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Configuration command as sent on a port's cfg topic.
    pub input: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
