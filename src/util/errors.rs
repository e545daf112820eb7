//! Error taxonomy for the vendoring pipeline.
//!
//! Every stage fails fast with one of these variants. Stage functions return
//! `anyhow::Result`, so callers can still `downcast_ref::<VendorError>()` to
//! find out which stage failed.

use std::path::PathBuf;

use thiserror::Error;

/// Exit state of a child process, for error messages.
pub fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// A fatal error from one of the pipeline stages.
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("failed to download `{name}` from {url}: {message}")]
    Network {
        name: String,
        url: String,
        message: String,
    },

    #[error("checksum mismatch for `{name}`:\n  expected: {expected}\n  actual:   {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("failed to extract `{}`: {message}", archive.display())]
    Extraction { archive: PathBuf, message: String },

    #[error("git operation failed for `{name}`: {message}")]
    VersionControl { name: String, message: String },

    #[error("`{tool}` not found for SDK `{sdk}`")]
    ToolchainNotFound { tool: String, sdk: String },

    #[error("preprocessor failed on `{}` ({status})\n{stderr}", source_path.display())]
    Preprocess {
        source_path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("failed to compile `{}` for {configuration} ({status})\n{stderr}", source_path.display())]
    Compilation {
        source_path: PathBuf,
        configuration: String,
        status: String,
        stderr: String,
    },

    #[error("relocatable link failed for {configuration} ({status})\n{stderr}")]
    Link {
        configuration: String,
        status: String,
        stderr: String,
    },

    #[error("symbol rewrite failed for `{}`: {message}", object.display())]
    SymbolRewrite { object: PathBuf, message: String },

    #[error("failed to merge libraries for SDK `{sdk}`: {message}")]
    Merge { sdk: String, message: String },

    #[error("packaging failed for `{}`: {message}", output.display())]
    Packaging { output: PathBuf, message: String },

    #[error("invalid build description: {0}")]
    Manifest(String),
}
