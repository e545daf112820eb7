//! Implementation of `vendorpack fetch`.

use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use crate::core::spec::FetchMethod;
use crate::core::Workspace;
use crate::sources::{acquire_archive, acquire_revision};
use crate::util::fs::copy_files;

/// Bring every external dependency into the scratch workspace at its pinned
/// version, then copy the project-local files next to them.
///
/// Dependencies are fetched in parallel. Running this twice leaves the
/// scratch trees unchanged.
pub fn fetch(ws: &Workspace) -> Result<Vec<PathBuf>> {
    ws.ensure_scratch()?;
    let scratch = ws.scratch();

    let trees = ws
        .spec()
        .dependencies
        .par_iter()
        .map(|dep| match &dep.method {
            FetchMethod::Archive { url, sha256 } => {
                acquire_archive(scratch, &dep.name, url, sha256.as_deref())
            }
            FetchMethod::Git { location, rev } => {
                acquire_revision(scratch, &dep.name, location, rev)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let local = &ws.spec().local;
    if !local.files.is_empty() {
        let from = ws.root().join(&local.dir);
        let copied = copy_files(&from, scratch, local.files.iter().map(String::as_str))?;
        tracing::info!("Copied {} local files from {}", copied, from.display());
    }

    Ok(trees)
}
