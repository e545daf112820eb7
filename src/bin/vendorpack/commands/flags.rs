//! `vendorpack flags` command

use anyhow::Result;

use crate::cli::{FlagsArgs, GlobalArgs};
use crate::commands::load_workspace;
use vendorpack::builder::flags::{configuration_flags, inference_flags};
use vendorpack::builder::{locate_toolchain, ProcessRunner};
use vendorpack::core::BuildConfiguration;

pub fn execute(args: FlagsArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;
    let spec = ws.spec();

    let flags = match (args.sdk, args.arch) {
        (Some(sdk), Some(arch)) => {
            let config = BuildConfiguration::apple(sdk, arch);
            let toolchain = locate_toolchain(&ProcessRunner, sdk)?;
            println!("# Flags for {}:", config);
            configuration_flags(spec, ws.scratch(), &config, &toolchain)
        }
        _ => {
            println!("# Header inference flags:");
            inference_flags(spec, ws.scratch())
        }
    };

    println!("C:   {}", flags.c.join(" "));
    println!("C++: {}", flags.cxx.join(" "));

    Ok(())
}
