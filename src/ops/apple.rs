//! Implementation of `vendorpack apple`.
//!
//! Archive each reduced object, merge the per-architecture archives of an
//! SDK into one fat library, then bundle the fat libraries into an
//! xcframework.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;

use crate::builder::compile::{CompileOutput, LinkedArtifact};
use crate::builder::executor::BuildExecutor;
use crate::builder::runner::{OutputMode, ToolchainRunner};
use crate::builder::toolchain::{xcframework_command, AppleToolchain};
use crate::core::target::AppleSdk;
use crate::core::Workspace;
use crate::util::errors::VendorError;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, remove_file_if_exists};

/// Options for the Apple build.
#[derive(Debug, Clone, Default)]
pub struct AppleOptions {
    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Verbose output
    pub verbose: bool,
}

/// One fat static library for an SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedLibrary {
    pub sdk: AppleSdk,
    pub library: PathBuf,
    pub archs: Vec<String>,
}

/// The published bundle.
#[derive(Debug, Clone)]
pub struct AppleBundle {
    pub xcframework: PathBuf,
    pub libraries: Vec<PackagedLibrary>,
}

/// Compile, reduce and package every Apple configuration.
pub fn build_apple(
    ws: &Workspace,
    runner: &dyn ToolchainRunner,
    opts: &AppleOptions,
) -> Result<AppleBundle> {
    let output = BuildExecutor::new(runner)
        .jobs(opts.jobs.or(ws.config().build.jobs))
        .verbose(opts.verbose)
        .execute(ws.spec(), ws.scratch())?;

    package_apple(ws, &output, runner)
}

/// Archive, merge and bundle already reduced artifacts.
pub fn package_apple(
    ws: &Workspace,
    output: &CompileOutput,
    runner: &dyn ToolchainRunner,
) -> Result<AppleBundle> {
    let Some(apple) = &ws.spec().apple else {
        return Err(VendorError::Manifest("no [apple] section".to_string()).into());
    };
    let lib_name = format!("lib{}.a", apple.library);

    let archives = output
        .artifacts
        .par_iter()
        .map(|artifact| {
            let toolchain = toolchain_for(output, artifact.configuration.sdk())?;
            archive(artifact, toolchain, &lib_name, runner)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut by_sdk: BTreeMap<AppleSdk, Vec<(String, PathBuf)>> = BTreeMap::new();
    for (artifact, archive) in output.artifacts.iter().zip(archives) {
        by_sdk
            .entry(artifact.configuration.sdk())
            .or_default()
            .push((artifact.configuration.arch().to_string(), archive));
    }

    let mut libraries = Vec::with_capacity(by_sdk.len());
    for (sdk, slices) in by_sdk {
        let toolchain = toolchain_for(output, sdk)?;
        let fat = ws.scratch().join(sdk.as_str()).join(&lib_name);
        libraries.push(merge(toolchain, &slices, &fat, runner)?);
    }

    let xcframework = ws.root().join(&apple.output);
    bundle(&libraries, &xcframework, runner)?;

    tracing::info!("Packaged {}", xcframework.display());

    Ok(AppleBundle {
        xcframework,
        libraries,
    })
}

fn toolchain_for(output: &CompileOutput, sdk: AppleSdk) -> Result<&AppleToolchain> {
    output.toolchains.get(&sdk).ok_or_else(|| {
        VendorError::ToolchainNotFound {
            tool: "toolchain".to_string(),
            sdk: sdk.to_string(),
        }
        .into()
    })
}

/// `ar rcs` the reduced object into `<work dir>/lib<name>.a`, replacing any
/// stale archive so old members never survive.
fn archive(
    artifact: &LinkedArtifact,
    toolchain: &AppleToolchain,
    lib_name: &str,
    runner: &dyn ToolchainRunner,
) -> Result<PathBuf> {
    let dir = artifact
        .object
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let library = dir.join(lib_name);
    remove_file_if_exists(&library)?;

    let cmd = toolchain.archive_command(std::slice::from_ref(&artifact.object), &library);
    let output = runner.execute(&cmd, OutputMode::Stream)?;
    if !output.success {
        return Err(VendorError::Packaging {
            output: library,
            message: format!("ar failed ({}): {}", output.status(), output.stderr.trim()),
        }
        .into());
    }
    Ok(library)
}

/// Merge per-architecture archives into one fat library and check its
/// slices.
fn merge(
    toolchain: &AppleToolchain,
    slices: &[(String, PathBuf)],
    fat: &Path,
    runner: &dyn ToolchainRunner,
) -> Result<PackagedLibrary> {
    let sdk = toolchain.sdk;
    let merge_error = |message: String| VendorError::Merge {
        sdk: sdk.to_string(),
        message,
    };

    if let Some(parent) = fat.parent() {
        ensure_dir(parent)?;
    }
    remove_file_if_exists(fat)?;

    let inputs: Vec<PathBuf> = slices.iter().map(|(_, lib)| lib.clone()).collect();
    let output = runner.execute(&toolchain.merge_command(&inputs, fat), OutputMode::Stream)?;
    if !output.success {
        return Err(merge_error(format!(
            "lipo failed ({}): {}",
            output.status(),
            output.stderr.trim()
        ))
        .into());
    }

    let output = runner.execute(&toolchain.archs_command(fat), OutputMode::Capture)?;
    if !output.success {
        return Err(merge_error(format!("cannot list slices ({})", output.status())).into());
    }
    let found: BTreeSet<&str> = output.stdout.split_whitespace().collect();
    let expected: BTreeSet<&str> = slices.iter().map(|(arch, _)| arch.as_str()).collect();
    if found != expected {
        return Err(merge_error(format!(
            "expected slices [{}], found [{}]",
            expected.into_iter().collect::<Vec<_>>().join(", "),
            found.into_iter().collect::<Vec<_>>().join(", ")
        ))
        .into());
    }

    tracing::info!("Merged {} slices for {}", slices.len(), sdk);

    Ok(PackagedLibrary {
        sdk,
        library: fat.to_path_buf(),
        archs: slices.iter().map(|(arch, _)| arch.clone()).collect(),
    })
}

/// Replace the xcframework with a fresh bundle of `libraries`.
fn bundle(
    libraries: &[PackagedLibrary],
    xcframework: &Path,
    runner: &dyn ToolchainRunner,
) -> Result<()> {
    let packaging = |message: String| VendorError::Packaging {
        output: xcframework.to_path_buf(),
        message,
    };

    if let Some(parent) = xcframework.parent() {
        ensure_dir(parent)?;
    }
    // xcodebuild refuses to overwrite an existing bundle
    remove_dir_all_if_exists(xcframework).map_err(|e| packaging(format!("{:#}", e)))?;

    let paths: Vec<PathBuf> = libraries.iter().map(|l| l.library.clone()).collect();
    let output = runner.execute(&xcframework_command(&paths, xcframework), OutputMode::Stream)?;
    if !output.success {
        return Err(packaging(format!(
            "xcodebuild failed ({}): {}",
            output.status(),
            output.stderr.trim()
        ))
        .into());
    }
    Ok(())
}
