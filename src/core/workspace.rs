//! Workspace - the project root, its scratch directory and its build
//! description.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::spec::{BuildSpec, MANIFEST_NAME};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Default scratch directory, relative to the project root.
const DEFAULT_SCRATCH: &str = "tmp";

/// A loaded project: where it lives, where scratch work happens, and what
/// it builds.
#[derive(Debug)]
pub struct Workspace {
    /// Absolute project root (the directory holding `Vendorpack.toml`)
    root: PathBuf,

    /// Absolute scratch workspace shared by every stage
    scratch: PathBuf,

    spec: BuildSpec,

    config: Config,
}

impl Workspace {
    /// Load a workspace from a manifest path, merging global and project
    /// tool configuration.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let spec = BuildSpec::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .canonicalize()
            .with_context(|| {
                format!("failed to resolve project root of {}", manifest_path.display())
            })?;

        let config = load_config(global_config_path().as_deref(), &project_config_path(&root));

        Ok(Workspace::new(root, spec, config))
    }

    /// Create a workspace from already-loaded parts.
    pub fn new(root: PathBuf, spec: BuildSpec, config: Config) -> Self {
        let scratch = root.join(
            config
                .build
                .scratch_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH)),
        );
        Workspace {
            root,
            scratch,
            spec,
            config,
        }
    }

    /// Get the project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the scratch workspace directory.
    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    /// Get the build description.
    pub fn spec(&self) -> &BuildSpec {
        &self.spec
    }

    /// Get the tool configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ensure the scratch directory exists.
    pub fn ensure_scratch(&self) -> Result<()> {
        std::fs::create_dir_all(&self.scratch).with_context(|| {
            format!(
                "failed to create scratch directory: {}",
                self.scratch.display()
            )
        })
    }
}

/// Find `Vendorpack.toml` in `start` or any of its ancestors.
pub fn find_manifest(start: &Path) -> Result<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        current = dir.parent();
    }

    bail!(
        "could not find `{}` in `{}` or any parent directory",
        MANIFEST_NAME,
        start.display()
    )
}
