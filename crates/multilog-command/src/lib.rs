//! Remote configuration command parsing for the multilog bridge.
//!
//! Configuration payloads arrive from the network, so everything here is
//! strict about sizes and digits: words are bounded, argument counts are
//! capped, and numbers go through [`safe_atoi_u32`] instead of a permissive
//! library parser.

pub mod atoi;
pub mod command;
pub mod error;
pub mod parser;

pub use atoi::{safe_atoi_u32, safe_atoi_u32_with, safe_atoi_u8, safe_atoi_u8_with, MAX_U32_DIGITS};
pub use command::PortCommand;
pub use error::{CommandError, Result};
pub use parser::{CommandArgs, MAX_STR_ARGV, MAX_STR_CMD_ARG_LEN};
