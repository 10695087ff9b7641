use multilog_bridge::{DeviceIdentity, TopicSet};

use crate::cmd::TopicsArgs;
use crate::exit::{bridge_error, CliResult, SUCCESS};
use crate::output::{print_topics, OutputFormat};

pub fn run(args: TopicsArgs, format: OutputFormat) -> CliResult<i32> {
    let identity = DeviceIdentity::new(&args.device_uuid)
        .map_err(|err| bridge_error("invalid device identity", err))?;
    let topics = TopicSet::new(identity.uuid(), args.ports + 1);
    print_topics(identity.uuid(), &topics, format);
    Ok(SUCCESS)
}
