//! Compiler flag sets.
//!
//! Header inference and every build configuration see the same definitions
//! and include paths; configurations add their target selection on top.

use std::path::Path;

use crate::builder::toolchain::AppleToolchain;
use crate::core::language::Language;
use crate::core::spec::BuildSpec;
use crate::core::target::BuildConfiguration;

/// Flags for C and C++ units of one compile job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    pub c: Vec<String>,
    pub cxx: Vec<String>,
}

impl FlagSet {
    /// Flags for a unit of the given language.
    pub fn for_language(&self, lang: Language) -> &[String] {
        match lang {
            Language::C => &self.c,
            Language::Cxx => &self.cxx,
        }
    }
}

/// `-D` and `-I` flags shared by inference and compilation. Include paths are
/// resolved against the scratch root.
pub fn common_flags(spec: &BuildSpec, scratch: &Path) -> Vec<String> {
    let mut flags = Vec::with_capacity(spec.defines.len() + spec.include_dirs.len());
    flags.extend(spec.defines.iter().map(|d| format!("-D{}", d)));
    flags.extend(
        spec.include_dirs
            .iter()
            .map(|dir| format!("-I{}", scratch.join(dir).display())),
    );
    flags
}

/// Flags for the dependency-reporting preprocessor pass.
pub fn inference_flags(spec: &BuildSpec, scratch: &Path) -> FlagSet {
    let c = common_flags(spec, scratch);
    let mut cxx = c.clone();
    cxx.push(spec.cxx_std.as_flag().to_string());
    FlagSet { c, cxx }
}

/// Flags for compiling the manifest for one configuration.
pub fn configuration_flags(
    spec: &BuildSpec,
    scratch: &Path,
    config: &BuildConfiguration,
    toolchain: &AppleToolchain,
) -> FlagSet {
    let mut c = vec![
        "-arch".to_string(),
        config.arch().to_string(),
        "-isysroot".to_string(),
        toolchain.sdk_path.display().to_string(),
    ];
    if let Some(apple) = &spec.apple {
        c.push(config.sdk().min_version_flag(&apple.deployment_target));
    }
    c.extend(spec.cflags.iter().cloned());
    c.extend(common_flags(spec, scratch));

    let mut cxx = c.clone();
    cxx.push(spec.cxx_std.as_flag().to_string());
    FlagSet { c, cxx }
}
