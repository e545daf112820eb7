//! Toolchain abstraction for the Apple cross compilers.
//!
//! This module generates every toolchain command the pipeline runs: compile,
//! relocatable link, symbol localization, symbol listing, archive and merge.
//! Commands are plain [`CommandSpec`] values and are executed through a
//! [`ToolchainRunner`](crate::builder::runner::ToolchainRunner).
//!
//! Binary locations come from `xcrun` for the SDK being targeted, so two
//! SDKs can resolve to different compilers (see [`detect`]).

use std::path::{Path, PathBuf};

use crate::core::language::Language;
use crate::core::target::AppleSdk;

mod detect;

pub use detect::locate_toolchain;

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "clang", "/usr/bin/lipo")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// File name of the program, for matching and messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Binaries and sysroot for one Apple SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleToolchain {
    pub sdk: AppleSdk,
    pub sdk_path: PathBuf,
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub ld: PathBuf,
    pub ar: PathBuf,
    pub lipo: PathBuf,
    pub nm: PathBuf,
    pub objcopy: PathBuf,
}

impl AppleToolchain {
    /// Compiler for a language.
    pub fn compiler(&self, lang: Language) -> &Path {
        match lang {
            Language::C => &self.cc,
            Language::Cxx => &self.cxx,
        }
    }

    /// `<cc|c++> <flags> -c <source> -o <object>`
    pub fn compile_command(
        &self,
        lang: Language,
        flags: &[String],
        source: &Path,
        object: &Path,
    ) -> CommandSpec {
        CommandSpec::new(self.compiler(lang))
            .args(flags.iter().cloned())
            .arg("-c")
            .arg(path_arg(source))
            .arg("-o")
            .arg(path_arg(object))
    }

    /// Link objects into a single relocatable object.
    pub fn relocatable_link_command(
        &self,
        arch: &str,
        objects: &[PathBuf],
        output: &Path,
    ) -> CommandSpec {
        CommandSpec::new(&self.ld)
            .arg("-r")
            .arg("-arch")
            .arg(arch)
            .arg("-o")
            .arg(path_arg(output))
            .args(objects.iter().map(|o| path_arg(o)))
    }

    /// Localize every global symbol of `object` in place except `keep`.
    ///
    /// Each kept name becomes a negated wildcard pattern ahead of the
    /// catch-all, so the first matching pattern wins.
    pub fn localize_command(&self, object: &Path, keep: &[String]) -> CommandSpec {
        CommandSpec::new(&self.objcopy)
            .arg("-w")
            .args(keep.iter().map(|s| format!("--localize-symbol=!{}", s)))
            .arg("--localize-symbol=*")
            .arg(path_arg(object))
    }

    /// List the names of externally visible defined symbols.
    pub fn list_globals_command(&self, object: &Path) -> CommandSpec {
        CommandSpec::new(&self.nm)
            .arg("-g")
            .arg("-U")
            .arg("-j")
            .arg(path_arg(object))
    }

    /// `ar rcs <output> <objects...>`
    pub fn archive_command(&self, objects: &[PathBuf], output: &Path) -> CommandSpec {
        CommandSpec::new(&self.ar)
            .arg("rcs")
            .arg(path_arg(output))
            .args(objects.iter().map(|o| path_arg(o)))
    }

    /// `lipo -create -output <output> <inputs...>`
    pub fn merge_command(&self, inputs: &[PathBuf], output: &Path) -> CommandSpec {
        CommandSpec::new(&self.lipo)
            .arg("-create")
            .arg("-output")
            .arg(path_arg(output))
            .args(inputs.iter().map(|i| path_arg(i)))
    }

    /// `lipo -archs <library>`
    pub fn archs_command(&self, library: &Path) -> CommandSpec {
        CommandSpec::new(&self.lipo).arg("-archs").arg(path_arg(library))
    }
}

/// Bundle per-SDK libraries into an xcframework.
pub fn xcframework_command(libraries: &[PathBuf], output: &Path) -> CommandSpec {
    let mut cmd = CommandSpec::new("xcodebuild").arg("-create-xcframework");
    for library in libraries {
        cmd = cmd.arg("-library").arg(path_arg(library));
    }
    cmd.arg("-output").arg(path_arg(output))
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
