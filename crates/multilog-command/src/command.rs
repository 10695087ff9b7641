use multilog_frame::FramingMode;
use serde::Serialize;

use crate::atoi::safe_atoi_u32;
use crate::error::{CommandError, Result};
use crate::parser::CommandArgs;

/// Keyword: start bridging the port.
pub const CMD_ENABLE: &str = "enable";
/// Keyword: stop bridging the port.
pub const CMD_DISABLE: &str = "disable";
/// Keyword: change the line speed (`bauds <rate>`).
pub const CMD_BAUDS: &str = "bauds";
/// Keyword: change the receive framing (`mode raw|line`).
pub const CMD_MODE: &str = "mode";

/// A validated per-port configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "value", rename_all = "lowercase")]
pub enum PortCommand {
    Enable,
    Disable,
    Bauds(u32),
    Mode(FramingMode),
}

impl PortCommand {
    /// Parse a raw configuration payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Self::from_args(&CommandArgs::parse(payload)?)
    }

    /// Decode an already tokenized command. Keywords are case-sensitive and
    /// arguments beyond the ones a command needs are ignored.
    pub fn from_args(args: &CommandArgs) -> Result<Self> {
        match args.cmd.as_str() {
            "" => Err(CommandError::InvalidInput("empty command".to_string())),
            CMD_ENABLE => Ok(Self::Enable),
            CMD_DISABLE => Ok(Self::Disable),
            CMD_BAUDS => {
                let value = args
                    .arg(0)
                    .ok_or_else(|| CommandError::MissingArgument(CMD_BAUDS.to_string()))?;
                let bauds = safe_atoi_u32(value, value.len())?;
                Ok(Self::Bauds(bauds))
            }
            CMD_MODE => {
                let value = args
                    .arg(0)
                    .ok_or_else(|| CommandError::MissingArgument(CMD_MODE.to_string()))?;
                match value {
                    "raw" => Ok(Self::Mode(FramingMode::Raw)),
                    "line" => Ok(Self::Mode(FramingMode::Line)),
                    other => Err(CommandError::InvalidMode(other.to_string())),
                }
            }
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}
