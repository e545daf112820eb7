//! `vendorpack update` command

use anyhow::Result;

use crate::cli::{GlobalArgs, UpdateArgs};
use crate::commands::load_workspace;
use vendorpack::builder::ProcessRunner;
use vendorpack::ops::{update, UpdateOptions};

pub fn execute(args: UpdateArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;

    let opts = UpdateOptions {
        jobs: args.jobs,
        verbose: global.verbose,
        skip_android: args.skip_android,
        skip_apple: args.skip_apple,
    };
    let report = update(&ws, &ProcessRunner, &opts)?;

    if let Some(android) = &report.android {
        eprintln!("   Generated {}", android.dir.display());
    }
    if let Some(apple) = &report.apple {
        eprintln!("    Packaged {}", apple.xcframework.display());
    }
    if report.android.is_none() && report.apple.is_none() {
        eprintln!("     Fetched {} dependencies", report.fetched.len());
    }
    Ok(())
}
