//! Per-configuration compilation and relocatable linking.
//!
//! Each configuration compiles the whole manifest into its own working
//! directory and links the objects into one relocatable object, the unit
//! visibility reduction operates on. Units of a configuration compile in
//! parallel; configurations themselves are also built in parallel.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;

use crate::builder::flags::configuration_flags;
use crate::builder::runner::{OutputMode, ToolchainRunner};
use crate::builder::toolchain::{locate_toolchain, AppleToolchain};
use crate::core::language::Language;
use crate::core::spec::{object_stem, BuildSpec};
use crate::core::target::{AppleSdk, BuildConfiguration};
use crate::util::errors::VendorError;
use crate::util::fs::ensure_dir;

/// The linked output of one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedArtifact {
    pub configuration: BuildConfiguration,
    /// Single relocatable object holding every compiled unit
    pub object: PathBuf,
    /// Per-unit objects, in manifest order
    pub units: Vec<PathBuf>,
}

/// Result of compiling every configuration.
#[derive(Debug)]
pub struct CompileOutput {
    /// Toolchain resolved for each SDK
    pub toolchains: BTreeMap<AppleSdk, AppleToolchain>,
    /// One artifact per configuration, in configuration order
    pub artifacts: Vec<LinkedArtifact>,
}

/// Compile and link the manifest for every configuration.
///
/// Toolchains are resolved once per SDK before anything compiles, so a
/// missing SDK fails before any work is done. `on_step` is called after each
/// unit compiles and after each link.
pub fn compile_all(
    spec: &BuildSpec,
    scratch: &Path,
    runner: &dyn ToolchainRunner,
    on_step: &(dyn Fn(&str) + Sync),
) -> Result<CompileOutput> {
    let configurations = spec.configurations();

    let mut toolchains = BTreeMap::new();
    for config in &configurations {
        if !toolchains.contains_key(&config.sdk()) {
            toolchains.insert(config.sdk(), locate_toolchain(runner, config.sdk())?);
        }
    }

    let artifacts = configurations
        .par_iter()
        .map(|config| {
            // located above for every SDK in use
            let toolchain = &toolchains[&config.sdk()];
            compile_configuration(spec, scratch, config, toolchain, runner, on_step)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CompileOutput {
        toolchains,
        artifacts,
    })
}

/// Compile every manifest unit for one configuration and link the objects
/// into `<work dir>/lib<library>.o`.
pub fn compile_configuration(
    spec: &BuildSpec,
    scratch: &Path,
    config: &BuildConfiguration,
    toolchain: &AppleToolchain,
    runner: &dyn ToolchainRunner,
    on_step: &(dyn Fn(&str) + Sync),
) -> Result<LinkedArtifact> {
    let library = match &spec.apple {
        Some(apple) => apple.library.as_str(),
        None => return Err(VendorError::Manifest("no [apple] section".to_string()).into()),
    };

    let work_dir = config.work_dir(scratch);
    ensure_dir(&work_dir)?;
    let flags = configuration_flags(spec, scratch, config, toolchain);

    tracing::info!("Compiling {} units for {}", spec.sources.len(), config);

    let units = spec
        .sources
        .par_iter()
        .map(|source| {
            let lang = Language::of(source);
            let object = work_dir.join(format!("{}.o", object_stem(source)));
            let cmd = toolchain.compile_command(
                lang,
                flags.for_language(lang),
                &scratch.join(source),
                &object,
            );

            let output = runner.execute(&cmd, OutputMode::Stream)?;
            if !output.success {
                return Err(VendorError::Compilation {
                    source_path: PathBuf::from(source),
                    configuration: config.id(),
                    status: output.status(),
                    stderr: output.stderr,
                }
                .into());
            }

            tracing::debug!("Compiled {} for {}", source, config.id());
            on_step(source);
            Ok(object)
        })
        .collect::<Result<Vec<_>>>()?;

    let object = work_dir.join(format!("lib{}.o", library));
    let cmd = toolchain.relocatable_link_command(config.arch(), &units, &object);
    let output = runner.execute(&cmd, OutputMode::Stream)?;
    if !output.success {
        return Err(VendorError::Link {
            configuration: config.id(),
            status: output.status(),
            stderr: output.stderr,
        }
        .into());
    }
    on_step(&config.id());

    Ok(LinkedArtifact {
        configuration: config.clone(),
        object,
        units,
    })
}
