//! Symbol visibility reduction.
//!
//! After the relocatable link every internal symbol of the vendored code is
//! still global, and would clash with any other copy of the same libraries
//! in the host app. Everything outside the public whitelist is made local,
//! then the object is checked so the exported surface is exactly the
//! whitelist.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;

use crate::builder::compile::LinkedArtifact;
use crate::builder::runner::{OutputMode, ToolchainRunner};
use crate::builder::toolchain::AppleToolchain;
use crate::util::errors::VendorError;

/// Localize every symbol of the artifact except `public_symbols`, in place.
///
/// Whitelist entries are C names; the platform's symbol prefix is added
/// before matching.
pub fn reduce_visibility(
    artifact: &LinkedArtifact,
    toolchain: &AppleToolchain,
    public_symbols: &[String],
    runner: &dyn ToolchainRunner,
) -> Result<()> {
    let prefix = artifact.configuration.family().symbol_prefix();
    let keep: Vec<String> = public_symbols
        .iter()
        .map(|s| format!("{}{}", prefix, s))
        .collect();

    let rewrite = |message: String| VendorError::SymbolRewrite {
        object: artifact.object.clone(),
        message,
    };

    let cmd = toolchain.localize_command(&artifact.object, &keep);
    let output = runner.execute(&cmd, OutputMode::Capture)?;
    if !output.success {
        return Err(rewrite(format!("{}: {}", output.status(), output.stderr.trim())).into());
    }

    let exported = exported_symbols(toolchain, &artifact.object, runner)?;
    let expected: BTreeSet<String> = keep.into_iter().collect();

    let leaked: Vec<_> = exported.difference(&expected).cloned().collect();
    if !leaked.is_empty() {
        return Err(rewrite(format!(
            "symbols outside the public whitelist are still exported: {}",
            leaked.join(", ")
        ))
        .into());
    }
    let missing: Vec<_> = expected.difference(&exported).cloned().collect();
    if !missing.is_empty() {
        return Err(rewrite(format!(
            "public symbols are not defined: {}",
            missing.join(", ")
        ))
        .into());
    }

    tracing::info!(
        "Reduced {} to {} exported symbols",
        artifact.configuration.id(),
        exported.len()
    );
    Ok(())
}

/// Names of the externally visible defined symbols of an object.
pub fn exported_symbols(
    toolchain: &AppleToolchain,
    object: &Path,
    runner: &dyn ToolchainRunner,
) -> Result<BTreeSet<String>> {
    let output = runner.execute(&toolchain.list_globals_command(object), OutputMode::Capture)?;
    if !output.success {
        return Err(VendorError::SymbolRewrite {
            object: object.to_path_buf(),
            message: format!("symbol listing failed ({})", output.status()),
        }
        .into());
    }
    Ok(parse_symbol_listing(&output.stdout))
}

/// Parse a name-only symbol listing, one symbol per line.
pub fn parse_symbol_listing(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .map(str::trim)
        // archive members are listed as `lib.a(member.o):`
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .map(str::to_string)
        .collect()
}
