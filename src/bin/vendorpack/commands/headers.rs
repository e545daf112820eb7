//! `vendorpack headers` command

use anyhow::Result;

use crate::cli::{GlobalArgs, HeadersArgs};
use crate::commands::load_workspace;
use vendorpack::builder::ProcessRunner;
use vendorpack::ops::headers;

pub fn execute(args: HeadersArgs, global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;

    let closure = headers(&ws, &ProcessRunner)?;

    if args.json {
        let list: Vec<&str> = closure.iter().collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        for header in closure.iter() {
            println!("{}", header);
        }
    }

    if let Some(android) = &ws.spec().android {
        for extra in closure.stale_overrides(&android.extra_files) {
            tracing::warn!("{} isn't needed in extra_files", extra);
        }
    }
    Ok(())
}
