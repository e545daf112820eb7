//! The process-running capability every stage goes through.
//!
//! Stages never spawn processes directly. They build a [`CommandSpec`] and
//! hand it to a [`ToolchainRunner`], which makes the orchestration testable
//! with a recording mock instead of a real toolchain.

use anyhow::Result;

use crate::builder::toolchain::CommandSpec;
use crate::util::errors::describe_exit;
use crate::util::process::ProcessBuilder;

/// What happens to a child's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Capture stdout for parsing (dependency reports, tool paths, symbol
    /// listings).
    Capture,
    /// Stream stdout to the terminal (build steps).
    Stream,
}

/// Result of running an external tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        ToolOutput {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        ToolOutput {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Human-readable exit state.
    pub fn status(&self) -> String {
        describe_exit(self.code)
    }
}

/// Runs external tools.
///
/// Implementations must be shareable across the worker threads that compile
/// configurations and units in parallel.
pub trait ToolchainRunner: Send + Sync {
    /// Run a command to completion.
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit is reported through [`ToolOutput::success`] so the caller can
    /// attach stage-specific context.
    fn execute(&self, cmd: &CommandSpec, mode: OutputMode) -> Result<ToolOutput>;
}

/// Runs commands as real child processes, inheriting the caller's
/// environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolchainRunner for ProcessRunner {
    fn execute(&self, cmd: &CommandSpec, mode: OutputMode) -> Result<ToolOutput> {
        let mut builder = ProcessBuilder::new(&cmd.program).args(&cmd.args);
        for (key, value) in &cmd.env {
            builder = builder.env(key, value);
        }

        tracing::debug!("Running {}", builder.display_command());

        let output = match mode {
            OutputMode::Capture => builder.exec()?,
            OutputMode::Stream => builder.exec_streamed()?,
        };

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
