//! `vendorpack apple` command

use anyhow::Result;

use crate::cli::{AppleArgs, GlobalArgs};
use crate::commands::load_workspace;
use vendorpack::builder::ProcessRunner;
use vendorpack::ops::{build_apple, fetch, AppleOptions};

pub fn execute(args: AppleArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;

    fetch(&ws)?;

    let opts = AppleOptions {
        jobs: args.jobs,
        verbose: global.verbose,
    };
    let bundle = build_apple(&ws, &ProcessRunner, &opts)?;

    for library in &bundle.libraries {
        eprintln!(
            "      Merged {} [{}]",
            library.sdk,
            library.archs.join(", ")
        );
    }
    eprintln!("    Packaged {}", bundle.xcframework.display());
    Ok(())
}
