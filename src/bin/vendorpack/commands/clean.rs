//! `vendorpack clean` command

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::load_workspace;
use vendorpack::ops::clean;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ws = load_workspace(global)?;

    clean(&ws)?;
    eprintln!("     Removed {}", ws.scratch().display());

    Ok(())
}
