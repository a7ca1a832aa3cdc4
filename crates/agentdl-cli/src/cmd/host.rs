use std::path::Path;

use agentdl_core::host::describe_host;
use anyhow::{Context, Result};

use super::{load_options, print_json};
use crate::HostArgs;

/// Print the host descriptor as JSON
pub fn host(config: Option<&Path>, args: &HostArgs) -> Result<()> {
    let mut options = load_options(config)?;
    args.apply(&mut options.host);
    let descriptor = describe_host(&options.host).context("Unable to describe this host")?;
    print_json(&descriptor)
}
