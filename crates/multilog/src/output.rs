use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use multilog_bridge::TopicSet;
use multilog_command::{CommandArgs, PortCommand};
use multilog_frame::is_reserved;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PortTopicsOutput<'a> {
    port: usize,
    bridged: bool,
    cfg: &'a str,
    rx: &'a str,
    tx: &'a str,
}

#[derive(Serialize)]
struct TopicsOutput<'a> {
    device: &'a str,
    control_in: &'a str,
    control_out: &'a str,
    status: &'a str,
    ports: Vec<PortTopicsOutput<'a>>,
    subscriptions: Vec<&'a str>,
}

pub fn print_topics(device: &str, topics: &TopicSet, format: OutputFormat) {
    let ports: Vec<PortTopicsOutput<'_>> = (0..topics.port_count())
        .filter_map(|port| {
            topics.port(port).map(|t| PortTopicsOutput {
                port,
                bridged: !is_reserved(port),
                cfg: &t.cfg,
                rx: &t.rx,
                tx: &t.tx,
            })
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = TopicsOutput {
                device,
                control_in: topics.control_in(),
                control_out: topics.control_out(),
                status: topics.status(),
                ports,
                subscriptions: topics.subscriptions().collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "DIRECTION", "TOPIC"]);
            table.add_row(vec!["-", "control", "in", topics.control_in()]);
            table.add_row(vec!["-", "control", "out", topics.control_out()]);
            table.add_row(vec!["-", "status", "out", topics.status()]);
            for port in ports.iter().filter(|p| p.bridged) {
                let index = port.port.to_string();
                table.add_row(vec![index.as_str(), "cfg", "in", port.cfg]);
                table.add_row(vec![index.as_str(), "rx", "out", port.rx]);
                table.add_row(vec![index.as_str(), "tx", "in/out", port.tx]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("device {device}");
            println!(
                "  control  {} -> {}",
                topics.control_in(),
                topics.control_out()
            );
            println!("  status   {}", topics.status());
            for port in &ports {
                if port.bridged {
                    println!(
                        "  port {:<3} cfg={} rx={} tx={}",
                        port.port, port.cfg, port.rx, port.tx
                    );
                } else {
                    println!("  port {:<3} console (not bridged)", port.port);
                }
            }
        }
        OutputFormat::Raw => {
            for topic in topics.subscriptions() {
                println!("{topic}");
            }
        }
    }
}

#[derive(Serialize)]
struct ParsedOutput<'a> {
    input: &'a str,
    cmd: &'a str,
    argc: usize,
    argv: &'a [String],
    command: Option<PortCommand>,
    error: Option<String>,
}

pub fn print_parsed(
    input: &str,
    args: &CommandArgs,
    decoded: &Result<PortCommand, multilog_command::CommandError>,
    format: OutputFormat,
) {
    let (command, error) = match decoded {
        Ok(command) => (Some(*command), None),
        Err(err) => (None, Some(err.to_string())),
    };

    match format {
        OutputFormat::Json => {
            let out = ParsedOutput {
                input,
                cmd: &args.cmd,
                argc: args.argc(),
                argv: &args.argv,
                command,
                error,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CMD", "ARGC", "ARGV", "RESULT"])
                .add_row(vec![
                    args.cmd.clone(),
                    args.argc().to_string(),
                    args.argv.join(" "),
                    describe(command, error.as_deref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "cmd={:?} argc={} argv={:?} result={}",
                args.cmd,
                args.argc(),
                args.argv,
                describe(command, error.as_deref())
            );
        }
        OutputFormat::Raw => {
            println!("{}", describe(command, error.as_deref()));
        }
    }
}

fn describe(command: Option<PortCommand>, error: Option<&str>) -> String {
    match (command, error) {
        (Some(PortCommand::Enable), _) => "enable".to_string(),
        (Some(PortCommand::Disable), _) => "disable".to_string(),
        (Some(PortCommand::Bauds(rate)), _) => format!("bauds {rate}"),
        (Some(PortCommand::Mode(mode)), _) => format!("mode {mode:?}").to_lowercase(),
        (None, Some(err)) => format!("error: {err}"),
        (None, None) => "error".to_string(),
    }
}
