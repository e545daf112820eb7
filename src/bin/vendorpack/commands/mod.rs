//! Command implementations

pub mod android;
pub mod apple;
pub mod clean;
pub mod completions;
pub mod fetch;
pub mod flags;
pub mod headers;
pub mod update;

use anyhow::Result;

use crate::cli::GlobalArgs;
use vendorpack::core::workspace::find_manifest;
use vendorpack::core::Workspace;

/// Load the workspace named by `--manifest-path`, or the nearest one above
/// the current directory.
pub fn load_workspace(global: &GlobalArgs) -> Result<Workspace> {
    let manifest_path = match &global.manifest_path {
        Some(path) => path.clone(),
        None => find_manifest(&std::env::current_dir()?)?,
    };
    Workspace::load(&manifest_path)
}
