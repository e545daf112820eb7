//! vendorpack CLI - vendors pinned C/C++ trees into mobile native packages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, GlobalArgs};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("vendorpack=debug")
    } else {
        EnvFilter::new("vendorpack=info")
    };

    // stdout is reserved for command output (`headers`, `flags`)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = GlobalArgs {
        verbose: cli.verbose,
        manifest_path: cli.manifest_path,
    };

    // Execute command
    match cli.command {
        Commands::Fetch => commands::fetch::execute(&global),
        Commands::Headers(args) => commands::headers::execute(args, &global),
        Commands::Android => commands::android::execute(&global),
        Commands::Apple(args) => commands::apple::execute(args, &global),
        Commands::Update(args) => commands::update::execute(args, &global),
        Commands::Flags(args) => commands::flags::execute(args, &global),
        Commands::Clean => commands::clean::execute(&global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
