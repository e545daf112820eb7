//! Implementation of `vendorpack android`.
//!
//! Writes the Android project tree: the vendored sources, their header
//! closure, the supplemental files and a generated `CMakeLists.txt`. The
//! Android build compiles everything itself, so no visibility reduction
//! happens here.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::headers::HeaderClosure;
use crate::core::spec::{AndroidSpec, BuildSpec};
use crate::core::Workspace;
use crate::util::errors::VendorError;
use crate::util::fs::{copy_files, ensure_dir, remove_dir_all_if_exists};

/// Name of the generated build file.
pub const CMAKE_FILE: &str = "CMakeLists.txt";

/// Outcome of writing the Android tree.
#[derive(Debug, Clone)]
pub struct AndroidTree {
    /// Destination directory
    pub dir: PathBuf,
    /// Number of files copied into it
    pub copied: usize,
    /// Supplemental files that inference already covers
    pub stale_overrides: Vec<String>,
}

/// Regenerate the Android project tree from the scratch workspace.
///
/// Everything is first assembled in a staging directory inside the
/// destination; a missing source, header or supplemental file fails there
/// and leaves the published tree untouched. Only then are the previously
/// vendored top-level trees replaced, so files dropped from the manifest or
/// the closure disappear. Bridge sources that live in the destination are
/// left alone. The build file is published last.
pub fn generate_android(ws: &Workspace, closure: &HeaderClosure) -> Result<AndroidTree> {
    let spec = ws.spec();
    let Some(android) = &spec.android else {
        return Err(VendorError::Manifest("no [android] section".to_string()).into());
    };

    let dir = ws.root().join(&android.output);
    let packaging = |message: String| VendorError::Packaging {
        output: dir.clone(),
        message,
    };

    let stale_overrides: Vec<String> = closure
        .stale_overrides(&android.extra_files)
        .into_iter()
        .map(str::to_string)
        .collect();
    for extra in &stale_overrides {
        tracing::warn!("{} isn't needed in extra_files", extra);
    }

    let files = spec
        .sources
        .iter()
        .map(String::as_str)
        .chain(closure.iter())
        .chain(android.extra_files.iter().map(String::as_str))
        .collect::<BTreeSet<_>>();

    ensure_dir(&dir).map_err(|e| packaging(format!("{:#}", e)))?;
    // same filesystem as the destination, so publishing is a rename
    let staging = tempfile::Builder::new()
        .prefix(".vendorpack-staging")
        .tempdir_in(&dir)
        .map_err(|e| packaging(format!("failed to create staging directory: {}", e)))?;

    let copied = copy_files(ws.scratch(), staging.path(), files)
        .map_err(|e| packaging(format!("{:#}", e)))?;
    std::fs::write(
        staging.path().join(CMAKE_FILE),
        render_cmake(spec, android),
    )
    .map_err(|e| packaging(format!("failed to write {}: {}", CMAKE_FILE, e)))?;

    for root in vendored_roots(spec, android, closure) {
        remove_dir_all_if_exists(&dir.join(&root)).map_err(|e| packaging(format!("{:#}", e)))?;
    }
    publish(staging.path(), &dir).map_err(|e| packaging(format!("{:#}", e)))?;

    tracing::info!("Wrote {} files to {}", copied + 1, dir.display());

    Ok(AndroidTree {
        dir,
        copied,
        stale_overrides,
    })
}

/// Move every top-level entry of `staging` into `dir`, the build file last.
fn publish(staging: &Path, dir: &Path) -> Result<()> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(staging)
        .with_context(|| format!("failed to read {}", staging.display()))?
    {
        let name = entry?.file_name();
        if name != CMAKE_FILE {
            names.push(name);
        }
    }
    names.push(CMAKE_FILE.into());

    for name in names {
        let (from, to) = (staging.join(&name), dir.join(&name));
        std::fs::rename(&from, &to)
            .with_context(|| format!("failed to move {} to {}", from.display(), to.display()))?;
    }
    Ok(())
}

/// The top-level directories this tool owns inside the Android tree.
fn vendored_roots(
    spec: &BuildSpec,
    android: &AndroidSpec,
    closure: &HeaderClosure,
) -> BTreeSet<String> {
    spec.sources
        .iter()
        .chain(android.extra_files.iter())
        .map(String::as_str)
        .chain(closure.iter())
        .filter_map(|path| path.split_once('/').map(|(root, _)| root.to_string()))
        .chain(spec.dependencies.iter().map(|dep| dep.name.clone()))
        .filter(|root| !root.is_empty() && root != "." && root != "..")
        .collect()
}

/// Render the generated `CMakeLists.txt`.
///
/// Deterministic: the same description always renders the same bytes.
pub fn render_cmake(spec: &BuildSpec, android: &AndroidSpec) -> String {
    let mut lines = vec![
        "# Auto-generated by vendorpack. Do not edit.".to_string(),
        "cmake_minimum_required(VERSION 3.4.1)".to_string(),
    ];
    if !android.compile_options.is_empty() {
        lines.push(format!(
            "add_compile_options({})",
            android.compile_options.join(" ")
        ));
    }
    lines.extend(spec.defines.iter().map(|d| format!("add_definitions(\"-D{}\")", d)));
    lines.extend(
        spec.include_dirs
            .iter()
            .map(|dir| format!("include_directories(\"{}\")", dir)),
    );

    let sources: Vec<&str> = android
        .bridge_sources
        .iter()
        .chain(spec.sources.iter())
        .map(String::as_str)
        .collect();
    lines.push(format!(
        "add_library({} SHARED {})",
        android.library,
        sources.join(" ")
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
