//! Implementation of `vendorpack clean`.

use anyhow::Result;

use crate::core::Workspace;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove the scratch workspace: fetched trees, downloaded archives and
/// every intermediate build product.
pub fn clean(ws: &Workspace) -> Result<()> {
    tracing::info!("Removing {}", ws.scratch().display());
    remove_dir_all_if_exists(ws.scratch())
}
