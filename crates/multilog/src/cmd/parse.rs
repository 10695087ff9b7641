use multilog_command::{CommandArgs, PortCommand};

use crate::cmd::ParseArgs;
use crate::exit::{command_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_parsed, OutputFormat};

/// Show how a port would interpret `args.input`. Exits with
/// [`DATA_INVALID`] when the device would drop the command.
pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let tokens = CommandArgs::parse_str(&args.input)
        .map_err(|err| command_error("tokenize failed", err))?;
    let decoded = PortCommand::from_args(&tokens);
    print_parsed(&args.input, &tokens, &decoded, format);

    Ok(if decoded.is_ok() { SUCCESS } else { DATA_INVALID })
}
