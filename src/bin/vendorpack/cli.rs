//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use vendorpack::core::AppleSdk;

/// vendorpack - vendors pinned C/C++ trees into Android and iOS packages
#[derive(Parser)]
#[command(name = "vendorpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to Vendorpack.toml (defaults to searching upward from the
    /// current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every pinned dependency into the scratch workspace
    Fetch,

    /// Infer the header closure of the source manifest
    Headers(HeadersArgs),

    /// Regenerate the Android project tree
    Android,

    /// Build the iOS xcframework
    Apple(AppleArgs),

    /// Fetch and regenerate every platform package
    Update(UpdateArgs),

    /// Show the compiler flags used for inference or a configuration
    Flags(FlagsArgs),

    /// Remove the scratch workspace
    Clean,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct HeadersArgs {
    /// Print the closure as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AppleArgs {
    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Do not regenerate the Android project tree
    #[arg(long)]
    pub skip_android: bool,

    /// Do not build the xcframework
    #[arg(long)]
    pub skip_apple: bool,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// SDK of the configuration (omit for the inference flags)
    #[arg(long, requires = "arch")]
    pub sdk: Option<AppleSdk>,

    /// Architecture of the configuration
    #[arg(long, requires = "sdk")]
    pub arch: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Options shared by every command.
pub struct GlobalArgs {
    pub verbose: bool,
    pub manifest_path: Option<PathBuf>,
}
