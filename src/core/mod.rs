//! Core data model: the build description, targets and the workspace.

pub mod language;
pub mod spec;
pub mod target;
pub mod workspace;

pub use language::{CppStandard, Language};
pub use spec::{BuildSpec, ExternalDependency, FetchMethod};
pub use target::{AppleSdk, BuildConfiguration, PlatformFamily};
pub use workspace::Workspace;
