//! External sources.
//!
//! Sources fetch the pinned third-party trees into the scratch workspace,
//! either as downloaded archives or as git checkouts.

pub mod archive;
pub mod git;

pub use archive::acquire_archive;
pub use git::acquire_revision;
