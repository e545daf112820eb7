//! `Vendorpack.toml` parsing and the immutable build description.
//!
//! The build description holds everything that is fixed for a run: the
//! pinned external dependencies, the source manifest, preprocessor
//! definitions, include paths, and the per-platform packaging settings.
//! It is loaded once and passed by reference into every stage.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::core::language::CppStandard;
use crate::core::target::{AppleSdk, BuildConfiguration};
use crate::util::errors::VendorError;

/// File name of the build description.
pub const MANIFEST_NAME: &str = "Vendorpack.toml";

/// How an external dependency is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMethod {
    /// Download an archive and unpack it into the scratch workspace.
    Archive { url: Url, sha256: Option<String> },
    /// Clone a git repository and pin it to an exact revision.
    Git { location: String, rev: String },
}

/// A pinned external source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDependency {
    /// Directory name inside the scratch workspace
    pub name: String,
    pub method: FetchMethod,
}

/// Project-local files copied into the scratch workspace next to the
/// fetched trees, so they compile with the same include paths.
#[derive(Debug, Clone, Default)]
pub struct LocalFiles {
    /// Directory the files are copied from, relative to the project root
    pub dir: PathBuf,
    /// Files relative to `dir`
    pub files: Vec<String>,
}

/// Android project-tree packaging settings.
#[derive(Debug, Clone)]
pub struct AndroidSpec {
    /// Destination tree, relative to the project root
    pub output: PathBuf,
    /// CMake library target name
    pub library: String,
    /// Bridge sources that already live in `output` (e.g. `jni.cpp`)
    pub bridge_sources: Vec<String>,
    /// Options for `add_compile_options`
    pub compile_options: Vec<String>,
    /// Licenses and headers needed by platform-conditional code paths that
    /// plain inference cannot see
    pub extra_files: Vec<String>,
}

/// Apple archive-and-merge packaging settings.
#[derive(Debug, Clone)]
pub struct AppleSpec {
    /// xcframework path, relative to the project root
    pub output: PathBuf,
    /// Static library name, without the `lib` prefix
    pub library: String,
    /// Minimum OS version
    pub deployment_target: String,
    /// The complete public ABI surface of the packaged library
    pub public_symbols: Vec<String>,
    /// SDKs and the architectures built for each
    pub sdks: BTreeMap<AppleSdk, Vec<String>>,
}

/// The immutable build description for one run.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    pub name: String,
    pub dependencies: Vec<ExternalDependency>,
    pub local: LocalFiles,
    /// Source manifest: every compilation unit, relative to the scratch root
    pub sources: Vec<String>,
    pub defines: Vec<String>,
    /// Include paths, relative to the scratch root
    pub include_dirs: Vec<String>,
    pub cxx_std: CppStandard,
    /// Optimization and portability flags shared by every compile
    pub cflags: Vec<String>,
    pub android: Option<AndroidSpec>,
    pub apple: Option<AppleSpec>,
}

impl BuildSpec {
    /// Load and validate a build description from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("invalid build description: {}", path.display()))
    }

    /// Parse and validate build description content.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawSpec = toml::from_str(content)
            .map_err(|e| VendorError::Manifest(format!("failed to parse {}: {}", MANIFEST_NAME, e)))?;

        let dependencies = raw
            .dependency
            .into_iter()
            .map(RawDependency::into_dependency)
            .collect::<Result<Vec<_>>>()?;

        let spec = BuildSpec {
            name: raw.package.name,
            dependencies,
            local: raw
                .local
                .map(|l| LocalFiles {
                    dir: l.dir,
                    files: l.files,
                })
                .unwrap_or_default(),
            sources: raw.build.sources,
            defines: raw.build.defines,
            include_dirs: raw.build.include_dirs,
            cxx_std: raw.build.cxx_std.unwrap_or_default(),
            cflags: raw.build.cflags,
            android: raw.android.map(|a| AndroidSpec {
                output: a.output,
                library: a.library,
                bridge_sources: a.bridge_sources,
                compile_options: a.compile_options,
                extra_files: a.extra_files,
            }),
            apple: raw.apple.map(RawApple::into_apple).transpose()?,
        };

        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(VendorError::Manifest("[build].sources is empty".to_string()).into());
        }

        let mut seen = HashSet::new();
        let mut base_names = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.as_str()) {
                return Err(
                    VendorError::Manifest(format!("duplicate source `{}`", source)).into(),
                );
            }
            // Objects are named after the source's base name, so two units
            // with the same stem would overwrite each other.
            let stem = object_stem(source);
            if !base_names.insert(stem.clone()) {
                return Err(VendorError::Manifest(format!(
                    "source `{}` has the same base name as another source (`{}`)",
                    source, stem
                ))
                .into());
            }
        }

        let mut names = HashSet::new();
        for dep in &self.dependencies {
            if !names.insert(dep.name.as_str()) {
                return Err(VendorError::Manifest(format!(
                    "duplicate dependency `{}`",
                    dep.name
                ))
                .into());
            }
        }

        if let Some(apple) = &self.apple {
            if apple.public_symbols.is_empty() {
                return Err(VendorError::Manifest(
                    "[apple].public_symbols must list at least one symbol".to_string(),
                )
                .into());
            }
            if apple.sdks.is_empty() || apple.sdks.values().any(|archs| archs.is_empty()) {
                return Err(VendorError::Manifest(
                    "every [[apple.sdk]] needs at least one architecture".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }

    /// All Apple build configurations: the cross product of SDKs and their
    /// architectures, in a stable order.
    pub fn configurations(&self) -> Vec<BuildConfiguration> {
        let Some(apple) = &self.apple else {
            return Vec::new();
        };
        apple
            .sdks
            .iter()
            .flat_map(|(sdk, archs)| {
                archs
                    .iter()
                    .map(move |arch| BuildConfiguration::apple(*sdk, arch.clone()))
            })
            .collect()
    }
}

/// Object file stem for a source: its base name without extension.
pub fn object_stem(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

// Raw TOML representation.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSpec {
    package: RawPackage,
    #[serde(default)]
    dependency: Vec<RawDependency>,
    local: Option<RawLocal>,
    build: RawBuild,
    android: Option<RawAndroid>,
    apple: Option<RawApple>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDependency {
    name: String,
    archive: Option<String>,
    sha256: Option<String>,
    git: Option<String>,
    rev: Option<String>,
}

impl RawDependency {
    fn into_dependency(self) -> Result<ExternalDependency> {
        let method = match (self.archive, self.git) {
            (Some(url), None) => {
                let url = Url::parse(&url).map_err(|e| {
                    VendorError::Manifest(format!(
                        "dependency `{}` has an invalid archive URL: {}",
                        self.name, e
                    ))
                })?;
                FetchMethod::Archive {
                    url,
                    sha256: self.sha256.map(|s| s.to_lowercase()),
                }
            }
            (None, Some(location)) => {
                let rev = self.rev.ok_or_else(|| {
                    VendorError::Manifest(format!(
                        "git dependency `{}` must pin a `rev`",
                        self.name
                    ))
                })?;
                FetchMethod::Git { location, rev }
            }
            _ => {
                return Err(VendorError::Manifest(format!(
                    "dependency `{}` needs exactly one of `archive` or `git`",
                    self.name
                ))
                .into())
            }
        };

        Ok(ExternalDependency {
            name: self.name,
            method,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawLocal {
    dir: PathBuf,
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBuild {
    sources: Vec<String>,
    #[serde(default)]
    defines: Vec<String>,
    #[serde(default)]
    include_dirs: Vec<String>,
    cxx_std: Option<CppStandard>,
    #[serde(default)]
    cflags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAndroid {
    output: PathBuf,
    library: String,
    #[serde(default)]
    bridge_sources: Vec<String>,
    #[serde(default)]
    compile_options: Vec<String>,
    #[serde(default)]
    extra_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApple {
    output: PathBuf,
    library: String,
    deployment_target: String,
    public_symbols: Vec<String>,
    #[serde(default)]
    sdk: Vec<RawAppleSdk>,
}

impl RawApple {
    fn into_apple(self) -> Result<AppleSpec> {
        let mut sdks = BTreeMap::new();
        for entry in self.sdk {
            // each (sdk, arch) pair owns its own work directory
            let mut archs = HashSet::new();
            if let Some(arch) = entry.archs.iter().find(|arch| !archs.insert(arch.as_str())) {
                return Err(VendorError::Manifest(format!(
                    "architecture `{}` is listed twice for SDK `{}`",
                    arch, entry.name
                ))
                .into());
            }
            if sdks.insert(entry.name, entry.archs).is_some() {
                return Err(VendorError::Manifest(format!(
                    "SDK `{}` has more than one [[apple.sdk]] entry",
                    entry.name
                ))
                .into());
            }
        }

        Ok(AppleSpec {
            output: self.output,
            library: self.library,
            deployment_target: self.deployment_target,
            public_symbols: self.public_symbols,
            sdks,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawAppleSdk {
    name: AppleSdk,
    archs: Vec<String>,
}
