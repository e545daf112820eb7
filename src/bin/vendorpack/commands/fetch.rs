//! `vendorpack fetch` command

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::load_workspace;
use vendorpack::ops::fetch;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;

    let trees = fetch(&ws)?;

    for tree in &trees {
        eprintln!("     Fetched {}", tree.display());
    }
    Ok(())
}
