//! Toolchain detection through `xcrun`.

use std::path::PathBuf;

use anyhow::Result;

use super::{AppleToolchain, CommandSpec};
use crate::builder::runner::{OutputMode, ToolchainRunner};
use crate::core::target::AppleSdk;
use crate::util::errors::VendorError;
use crate::util::process::find_executable;

/// Locate the compilers, binary tools and sysroot for an SDK.
///
/// Every tool is resolved with `xcrun --sdk <sdk> --find <tool>`. The symbol
/// rewriting tool is not shipped by every Xcode, so it falls back to a
/// `PATH` lookup.
pub fn locate_toolchain(runner: &dyn ToolchainRunner, sdk: AppleSdk) -> Result<AppleToolchain> {
    let sdk_path = xcrun(runner, sdk, "--show-sdk-path", "sdk path")?;

    let toolchain = AppleToolchain {
        sdk,
        sdk_path,
        cc: find_tool(runner, sdk, "clang")?,
        cxx: find_tool(runner, sdk, "clang++")?,
        ld: find_tool(runner, sdk, "ld")?,
        ar: find_tool(runner, sdk, "ar")?,
        lipo: find_tool(runner, sdk, "lipo")?,
        nm: find_tool(runner, sdk, "nm")?,
        objcopy: match find_tool(runner, sdk, "llvm-objcopy") {
            Ok(path) => path,
            Err(e) => find_executable("llvm-objcopy").ok_or(e)?,
        },
    };

    tracing::debug!(
        "Located {} toolchain: cc={} sysroot={}",
        sdk,
        toolchain.cc.display(),
        toolchain.sdk_path.display()
    );

    Ok(toolchain)
}

fn find_tool(runner: &dyn ToolchainRunner, sdk: AppleSdk, tool: &str) -> Result<PathBuf> {
    let cmd = CommandSpec::new("xcrun")
        .arg("--sdk")
        .arg(sdk.as_str())
        .arg("--find")
        .arg(tool);
    query(runner, &cmd, sdk, tool)
}

fn xcrun(runner: &dyn ToolchainRunner, sdk: AppleSdk, flag: &str, what: &str) -> Result<PathBuf> {
    let cmd = CommandSpec::new("xcrun").arg("--sdk").arg(sdk.as_str()).arg(flag);
    query(runner, &cmd, sdk, what)
}

fn query(
    runner: &dyn ToolchainRunner,
    cmd: &CommandSpec,
    sdk: AppleSdk,
    tool: &str,
) -> Result<PathBuf> {
    let not_found = || VendorError::ToolchainNotFound {
        tool: tool.to_string(),
        sdk: sdk.to_string(),
    };

    // xcrun itself missing (not a macOS host) counts as not found
    let output = runner
        .execute(cmd, OutputMode::Capture)
        .map_err(|_| not_found())?;

    let path = output.stdout.trim();
    if !output.success || path.is_empty() {
        return Err(not_found().into());
    }

    Ok(PathBuf::from(path))
}
