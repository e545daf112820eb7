//! Implementation of `vendorpack update`: the whole pipeline.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::runner::ToolchainRunner;
use crate::core::Workspace;
use crate::ops::android::{generate_android, AndroidTree};
use crate::ops::apple::{build_apple, AppleBundle, AppleOptions};
use crate::ops::fetch::fetch;
use crate::ops::headers::headers;

/// Options for the update command.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Verbose output
    pub verbose: bool,

    /// Do not regenerate the Android tree
    pub skip_android: bool,

    /// Do not rebuild the xcframework
    pub skip_apple: bool,
}

/// What an update produced.
#[derive(Debug)]
pub struct UpdateReport {
    pub fetched: Vec<PathBuf>,
    pub android: Option<AndroidTree>,
    pub apple: Option<AppleBundle>,
}

/// Fetch every dependency, then regenerate each configured platform package.
///
/// Platforms without a section in the build description are skipped. The
/// first failing stage aborts the run.
pub fn update(
    ws: &Workspace,
    runner: &dyn ToolchainRunner,
    opts: &UpdateOptions,
) -> Result<UpdateReport> {
    let fetched = fetch(ws)?;

    let android = if ws.spec().android.is_some() && !opts.skip_android {
        let closure = headers(ws, runner)?;
        Some(generate_android(ws, &closure)?)
    } else {
        None
    };

    let apple = if ws.spec().apple.is_some() && !opts.skip_apple {
        let apple_opts = AppleOptions {
            jobs: opts.jobs,
            verbose: opts.verbose,
        };
        Some(build_apple(ws, runner, &apple_opts)?)
    } else {
        None
    };

    Ok(UpdateReport {
        fetched,
        android,
        apple,
    })
}
