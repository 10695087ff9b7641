use multilog_bridge::version_string;
use multilog_command::{MAX_STR_ARGV, MAX_STR_CMD_ARG_LEN};
use multilog_frame::DEFAULT_CAPACITY;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("multilog {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: multilog");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("control_reply: {}", version_string());
    println!(
        "target: {}",
        option_env!("MULTILOG_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("MULTILOG_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: serial={}, mqtt={}, cli=true",
        cfg!(feature = "serial"),
        cfg!(feature = "mqtt")
    );
    println!(
        "limits: rx_buffer={DEFAULT_CAPACITY}, cmd_arg_len={MAX_STR_CMD_ARG_LEN}, max_args={MAX_STR_ARGV}"
    );

    Ok(SUCCESS)
}
