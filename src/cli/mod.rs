//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Config, ConfigOptions};
use crate::core::context::BuildContext;
use crate::core::driver::Driver;
use crate::core::global_config::GlobalConfig;
use crate::infra::dirs::CheribuildDirs;

/// Build the CHERI toolchain, CheriBSD and a QEMU disk image
///
/// Targets run in dependency order: binutils, qemu, llvm, cheribsd,
/// disk-image, run.
#[derive(Parser, Debug)]
#[command(name = "cheribuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print the commands instead of running them
    #[arg(short, long)]
    pub pretend: bool,

    /// Don't show stdout of the commands that are executed
    #[arg(short, long)]
    pub quiet: bool,

    /// Remove the build directories before building
    #[arg(short, long)]
    pub clean: bool,

    /// Skip the git pull step
    #[arg(long)]
    pub skip_update: bool,

    /// Skip the configure step
    #[arg(long)]
    pub skip_configure: bool,

    /// List all available targets and exit
    #[arg(long)]
    pub list_targets: bool,

    /// Directory holding all the sources [default: ~/cheri]
    #[arg(long, env = "CHERIBUILD_SOURCE_ROOT", value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Directory for build artifacts [default: <source-root>/output]
    #[arg(long, env = "CHERIBUILD_OUTPUT_ROOT", value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Additional files for the disk image [default: <source-root>/extra-files]
    #[arg(long, value_name = "DIR")]
    pub extra_files: Option<PathBuf>,

    /// Output path of the QEMU disk image [default: <output-root>/disk.img]
    #[arg(long = "disk-image-path", value_name = "IMAGE")]
    pub disk_image: Option<PathBuf>,

    /// Number of parallel jobs for make and ninja
    #[arg(
        short = 'j',
        long = "make-jobs",
        env = "CHERIBUILD_JOBS",
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub jobs: Option<u32>,

    /// Configuration file to use instead of the default config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Targets to build
    #[arg(value_name = "TARGET", default_value = "all")]
    pub targets: Vec<String>,
}

impl Cli {
    /// Raw options given on the command line
    pub fn options(&self) -> ConfigOptions {
        ConfigOptions {
            source_root: self.source_root.clone(),
            output_root: self.output_root.clone(),
            extra_files: self.extra_files.clone(),
            disk_image: self.disk_image.clone(),
            jobs: self.jobs.and_then(|jobs| usize::try_from(jobs).ok()),
            pretend: self.pretend,
            quiet: self.quiet,
            clean: self.clean,
            skip_update: self.skip_update,
            skip_configure: self.skip_configure,
            list_targets: self.list_targets,
            targets: self.targets.clone(),
        }
    }

    /// Execute the requested targets
    pub async fn run(self) -> Result<()> {
        let global = match &self.config {
            Some(path) => GlobalConfig::load_from_path(path),
            None => GlobalConfig::load(&CheribuildDirs::new()),
        }
        .context("Failed to load configuration")?;

        let config = Config::from_options(global.apply_to(self.options()))?;
        let driver = Driver::for_config(&config);

        if config.list_targets() {
            println!("{}", driver.describe_targets());
            return Ok(());
        }

        // reject bad names before anything touches the disk
        driver.select(config.targets())?;
        config.create_root_directories()?;

        let ctx = BuildContext::new(Arc::new(config));
        driver.run(&ctx, ctx.config().targets()).await?;
        output::display_success(ctx.config().targets());
        Ok(())
    }
}
