//! Tool configuration for vendorpack.
//!
//! Two configuration file locations are supported:
//! - Global: `~/.vendorpack/config.toml` - User-wide defaults
//! - Project: `.vendorpack/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. These files tune how
//! the pipeline runs (parallelism, preprocessor binary, scratch location);
//! what gets built lives in `Vendorpack.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the preprocessor used for header
/// inference.
pub const PREPROCESSOR_ENV: &str = "VENDORPACK_PREPROCESSOR";

/// vendorpack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildSettings,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Default number of parallel jobs (None = one per CPU)
    pub jobs: Option<usize>,

    /// Preprocessor used for header inference (default: `clang`)
    pub preprocessor: Option<PathBuf>,

    /// Scratch workspace, relative to the project root (default: `tmp`)
    pub scratch_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or can't be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.preprocessor.is_some() {
            self.build.preprocessor = other.build.preprocessor;
        }
        if other.build.scratch_dir.is_some() {
            self.build.scratch_dir = other.build.scratch_dir;
        }
    }

    /// The preprocessor to run for header inference.
    ///
    /// `VENDORPACK_PREPROCESSOR` wins over config files.
    pub fn preprocessor(&self) -> PathBuf {
        std::env::var_os(PREPROCESSOR_ENV)
            .map(PathBuf::from)
            .or_else(|| self.build.preprocessor.clone())
            .unwrap_or_else(|| PathBuf::from("clang"))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.vendorpack/config.toml)
/// 2. Global config (~/.vendorpack/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global vendorpack config directory (~/.vendorpack).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".vendorpack"))
}

/// Get the global config path (~/.vendorpack/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.vendorpack/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".vendorpack").join("config.toml")
}
