//! Native build steps.
//!
//! This module drives the external toolchain: header inference, per
//! configuration compilation, relocatable linking and visibility reduction.

pub mod compile;
pub mod executor;
pub mod flags;
pub mod headers;
pub mod runner;
pub mod toolchain;
pub mod visibility;

pub use compile::{CompileOutput, LinkedArtifact};
pub use executor::BuildExecutor;
pub use headers::{infer_headers, HeaderClosure};
pub use runner::{OutputMode, ProcessRunner, ToolOutput, ToolchainRunner};
pub use toolchain::{locate_toolchain, AppleToolchain, CommandSpec};
