//! Git sources - dependencies pinned to an exact revision.

use std::path::{Path, PathBuf};

use anyhow::Result;
use git2::build::CheckoutBuilder;
use git2::{Commit, Repository, ResetType};

use crate::util::errors::VendorError;

/// Clone (if needed) and force a checkout onto the pinned revision.
///
/// The reset runs on every call, even when the checkout already existed, so
/// local edits or a different HEAD are always undone. Submodules are then
/// initialized and updated recursively.
pub fn acquire_revision(scratch: &Path, name: &str, location: &str, rev: &str) -> Result<PathBuf> {
    let checkout = scratch.join(name);
    let vcs = |message: String| VendorError::VersionControl {
        name: name.to_string(),
        message,
    };

    let repo = if checkout.exists() {
        Repository::open(&checkout)
            .map_err(|e| vcs(format!("failed to open {}: {}", checkout.display(), e)))?
    } else {
        tracing::info!("Cloning {}", name);
        Repository::clone(location, &checkout)
            .map_err(|e| vcs(format!("failed to clone {}: {}", location, e)))?
    };

    tracing::info!("Checking out {} at {}", name, short(rev));

    let commit = match resolve_commit(&repo, rev) {
        Ok(commit) => commit,
        Err(_) => {
            // A checkout made before the pin moved may not know the commit yet.
            fetch_origin(&repo).map_err(|e| vcs(format!("failed to fetch origin: {}", e)))?;
            resolve_commit(&repo, rev)
                .map_err(|e| vcs(format!("cannot resolve revision `{}`: {}", rev, e)))?
        }
    };

    repo.set_head_detached(commit.id())
        .map_err(|e| vcs(format!("failed to detach HEAD: {}", e)))?;

    let mut checkout_opts = CheckoutBuilder::new();
    checkout_opts.force();
    repo.reset(commit.as_object(), ResetType::Hard, Some(&mut checkout_opts))
        .map_err(|e| vcs(format!("failed to reset to {}: {}", rev, e)))?;

    update_submodules(&repo).map_err(|e| vcs(format!("failed to update submodules: {}", e)))?;

    Ok(checkout)
}

/// The commit HEAD of a checkout points at.
pub fn head_commit(checkout: &Path) -> Result<String> {
    let repo = Repository::open(checkout)?;
    let head = repo.head()?.peel_to_commit()?;
    Ok(head.id().to_string())
}

fn resolve_commit<'r>(repo: &'r Repository, rev: &str) -> Result<Commit<'r>, git2::Error> {
    repo.revparse_single(rev)?.peel_to_commit()
}

fn fetch_origin(repo: &Repository) -> Result<(), git2::Error> {
    let mut remote = repo.find_remote("origin")?;
    remote.fetch(
        &[
            "+refs/heads/*:refs/remotes/origin/*",
            "+refs/tags/*:refs/tags/*",
        ],
        None,
        None,
    )
}

fn update_submodules(repo: &Repository) -> Result<(), git2::Error> {
    for mut submodule in repo.submodules()? {
        tracing::debug!(
            "Updating submodule {}",
            submodule.path().display()
        );
        submodule.update(true, None)?;
        let nested = submodule.open()?;
        update_submodules(&nested)?;
    }
    Ok(())
}

fn short(rev: &str) -> &str {
    rev.get(..8).unwrap_or(rev)
}
