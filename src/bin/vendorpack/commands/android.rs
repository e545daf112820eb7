//! `vendorpack android` command

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::load_workspace;
use vendorpack::builder::ProcessRunner;
use vendorpack::ops::{fetch, generate_android, headers};

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;

    fetch(&ws)?;
    let closure = headers(&ws, &ProcessRunner)?;
    let tree = generate_android(&ws, &closure)?;

    eprintln!(
        "   Generated {} ({} files, {} headers)",
        tree.dir.display(),
        tree.copied,
        closure.len()
    );
    Ok(())
}
