//! Implementation of `vendorpack headers`.

use anyhow::Result;

use crate::builder::headers::{infer_headers, HeaderClosure};
use crate::builder::runner::ToolchainRunner;
use crate::core::Workspace;

/// Infer the header closure of the workspace's manifest with the configured
/// preprocessor. Nothing is fetched; the scratch trees must already exist.
pub fn headers(ws: &Workspace, runner: &dyn ToolchainRunner) -> Result<HeaderClosure> {
    let preprocessor = ws.config().preprocessor();
    tracing::debug!("Using preprocessor {}", preprocessor.display());
    infer_headers(ws.spec(), ws.scratch(), &preprocessor, runner)
}
