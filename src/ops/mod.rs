//! High-level operations.
//!
//! This module contains the implementation of vendorpack commands.

pub mod android;
pub mod apple;
pub mod clean;
pub mod fetch;
pub mod headers;
pub mod update;

pub use android::{generate_android, render_cmake, AndroidTree};
pub use apple::{build_apple, package_apple, AppleBundle, AppleOptions, PackagedLibrary};
pub use clean::clean;
pub use fetch::fetch;
pub use headers::headers;
pub use update::{update, UpdateOptions, UpdateReport};
