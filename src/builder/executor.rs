//! Build executor with progress reporting.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::builder::compile::{compile_all, CompileOutput};
use crate::builder::runner::ToolchainRunner;
use crate::builder::visibility::reduce_visibility;
use crate::core::spec::BuildSpec;
use crate::util::errors::VendorError;

/// Runs compilation and visibility reduction for every Apple configuration.
pub struct BuildExecutor<'a> {
    runner: &'a dyn ToolchainRunner,
    verbose: bool,
    jobs: Option<usize>,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(runner: &'a dyn ToolchainRunner) -> Self {
        BuildExecutor {
            runner,
            verbose: false,
            jobs: None,
        }
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Limit the number of parallel tool invocations.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Compile, link and reduce every configuration.
    pub fn execute(&self, spec: &BuildSpec, scratch: &Path) -> Result<CompileOutput> {
        let Some(apple) = &spec.apple else {
            return Err(VendorError::Manifest("no [apple] section".to_string()).into());
        };

        match self.jobs {
            Some(jobs) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()
                    .context("failed to create build thread pool")?;
                pool.install(|| self.run(spec, scratch, &apple.public_symbols))
            }
            None => self.run(spec, scratch, &apple.public_symbols),
        }
    }

    fn run(&self, spec: &BuildSpec, scratch: &Path, public_symbols: &[String]) -> Result<CompileOutput> {
        let start = Instant::now();
        let configurations = spec.configurations().len();

        if self.verbose {
            eprintln!(
                "   Compiling {} file(s) for {} configuration(s)",
                spec.sources.len(),
                configurations
            );
        }

        let total = configurations * (spec.sources.len() + 1);
        let pb = if !self.verbose && total > 1 {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .context("invalid progress template")?
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let on_step = |step: &str| {
            if let Some(pb) = &pb {
                pb.set_message(step.to_string());
                pb.inc(1);
            }
        };
        let output = compile_all(spec, scratch, self.runner, &on_step);

        if let Some(pb) = &pb {
            if output.is_ok() {
                pb.finish_with_message("done");
            } else {
                pb.abandon();
            }
        }
        let output = output?;

        output.artifacts.par_iter().try_for_each(|artifact| {
            let toolchain = &output.toolchains[&artifact.configuration.sdk()];
            reduce_visibility(artifact, toolchain, public_symbols, self.runner)
        })?;

        eprintln!(
            "    Finished {} configuration(s) in {:.2}s",
            output.artifacts.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(output)
    }
}
