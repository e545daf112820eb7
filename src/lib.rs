//! vendorpack - vendors third-party C/C++ trees into mobile native packages
//!
//! This crate provides the library behind the `vendorpack` binary: fetching
//! pinned sources, inferring header closures, generating the Android CMake
//! tree, and building the iOS xcframework.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for vendorpack unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording toolchain runner and on-disk
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildSpec, Workspace};
pub use util::errors::VendorError;
