//! Test utilities and mocks for vendorpack unit tests.
//!
//! The central piece is [`MockRunner`], a [`ToolchainRunner`] that records
//! every command and answers with canned output, so the pipeline can be
//! exercised on hosts without Xcode.
//!
//! # Example
//!
//! ```rust,ignore
//! use vendorpack::test_support::MockRunner;
//!
//! #[test]
//! fn test_example() {
//!     let runner = MockRunner::exporting(&["_fixture_entry"]);
//!     // run a stage with &runner ...
//!     assert_eq!(runner.calls_to("lipo").len(), 2);
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

use crate::builder::runner::{OutputMode, ToolOutput, ToolchainRunner};
use crate::builder::toolchain::{AppleToolchain, CommandSpec};
use crate::core::target::AppleSdk;

// Re-export fixtures for convenience
pub use fixtures::*;

type Handler = Box<dyn Fn(&CommandSpec) -> Option<ToolOutput> + Send + Sync>;

/// Recording runner with scripted responses.
///
/// A custom handler is consulted first; when it returns `None` (or there is
/// none) the built-in toolchain behaviour answers:
///
/// - `xcrun --find <tool>` prints `/toolchain/<sdk>/<tool>`
/// - `xcrun --show-sdk-path` prints `/sdk/<sdk>`
/// - `lipo -archs <lib>` prints the architectures of the inputs an earlier
///   `lipo -create` merged into `<lib>`
/// - everything else succeeds silently
#[derive(Default)]
pub struct MockRunner {
    handler: Option<Handler>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl MockRunner {
    /// Create a runner with only the built-in responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with a custom handler in front of the built-in
    /// responses.
    pub fn with_handler(
        handler: impl Fn(&CommandSpec) -> Option<ToolOutput> + Send + Sync + 'static,
    ) -> Self {
        MockRunner {
            handler: Some(Box::new(handler)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a runner whose symbol listing reports exactly `symbols`.
    pub fn exporting(symbols: &[&str]) -> Self {
        let listing: String = symbols.iter().map(|s| format!("{}\n", s)).collect();
        Self::with_handler(move |cmd| {
            (cmd.program_name() == "nm").then(|| ToolOutput::success(listing.clone()))
        })
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands whose program file name is `program`.
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.program_name() == program)
            .collect()
    }

    fn builtin_response(&self, cmd: &CommandSpec) -> ToolOutput {
        match cmd.program_name().as_str() {
            "xcrun" => xcrun_response(cmd),
            "lipo" if cmd.args.first().map(String::as_str) == Some("-archs") => {
                let library = cmd.args.get(1).cloned().unwrap_or_default();
                ToolOutput::success(self.merged_archs(&library).join(" "))
            }
            _ => ToolOutput::success(""),
        }
    }

    fn merged_archs(&self, library: &str) -> Vec<String> {
        let calls = self.calls.lock().unwrap();
        let Some(create) = calls.iter().rev().find(|c| {
            c.program_name() == "lipo"
                && c.args.first().map(String::as_str) == Some("-create")
                && c.args.get(2).map(String::as_str) == Some(library)
        }) else {
            return Vec::new();
        };

        // inputs live in `<scratch>/<sdk>-<arch>/`
        create.args[3..]
            .iter()
            .filter_map(|input| {
                let dir = Path::new(input).parent()?.file_name()?.to_string_lossy();
                dir.split_once('-').map(|(_, arch)| arch.to_string())
            })
            .collect()
    }
}

impl ToolchainRunner for MockRunner {
    fn execute(&self, cmd: &CommandSpec, _mode: OutputMode) -> Result<ToolOutput> {
        let response = self
            .handler
            .as_ref()
            .and_then(|handler| handler(cmd))
            .unwrap_or_else(|| self.builtin_response(cmd));
        self.calls.lock().unwrap().push(cmd.clone());
        Ok(response)
    }
}

fn xcrun_response(cmd: &CommandSpec) -> ToolOutput {
    let sdk = cmd
        .args
        .iter()
        .position(|a| a == "--sdk")
        .and_then(|i| cmd.args.get(i + 1))
        .cloned()
        .unwrap_or_default();

    if cmd.args.iter().any(|a| a == "--show-sdk-path") {
        return ToolOutput::success(format!("/sdk/{}\n", sdk));
    }
    match cmd.args.iter().position(|a| a == "--find") {
        Some(i) => {
            let tool = cmd.args.get(i + 1).cloned().unwrap_or_default();
            ToolOutput::success(format!("/toolchain/{}/{}\n", sdk, tool))
        }
        None => ToolOutput::failure(64, "xcrun: error: unrecognized invocation"),
    }
}

/// The toolchain [`MockRunner`] resolves for an SDK.
pub fn fake_toolchain(sdk: AppleSdk) -> AppleToolchain {
    let tool = |name: &str| PathBuf::from(format!("/toolchain/{}/{}", sdk, name));
    AppleToolchain {
        sdk,
        sdk_path: PathBuf::from(format!("/sdk/{}", sdk)),
        cc: tool("clang"),
        cxx: tool("clang++"),
        ld: tool("ld"),
        ar: tool("ar"),
        lipo: tool("lipo"),
        nm: tool("nm"),
        objcopy: tool("llvm-objcopy"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_records_calls() {
        let runner = MockRunner::new();
        runner
            .execute(&CommandSpec::new("ar").arg("rcs"), OutputMode::Stream)
            .unwrap();
        runner
            .execute(&CommandSpec::new("/usr/bin/ar").arg("t"), OutputMode::Capture)
            .unwrap();

        assert_eq!(runner.calls().len(), 2);
        assert_eq!(runner.calls_to("ar").len(), 2);
        assert!(runner.calls_to("lipo").is_empty());
    }

    #[test]
    fn test_mock_lipo_reports_merged_archs() {
        let runner = MockRunner::new();
        runner
            .execute(
                &CommandSpec::new("lipo").args([
                    "-create",
                    "-output",
                    "/t/iphoneos/libx.a",
                    "/t/iphoneos-armv7/libx.a",
                    "/t/iphoneos-arm64/libx.a",
                ]),
                OutputMode::Stream,
            )
            .unwrap();

        let out = runner
            .execute(
                &CommandSpec::new("lipo").args(["-archs", "/t/iphoneos/libx.a"]),
                OutputMode::Capture,
            )
            .unwrap();
        assert_eq!(out.stdout, "armv7 arm64");
    }

    #[test]
    fn test_handler_takes_precedence() {
        let runner = MockRunner::with_handler(|cmd| {
            (cmd.program_name() == "ld").then(|| ToolOutput::failure(1, "ld: symbol(s) not found"))
        });
        let out = runner
            .execute(&CommandSpec::new("ld"), OutputMode::Stream)
            .unwrap();
        assert!(!out.success);
        let out = runner
            .execute(&CommandSpec::new("ar"), OutputMode::Stream)
            .unwrap();
        assert!(out.success);
    }
}
