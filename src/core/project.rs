//! The buildable unit
//!
//! Every target implements [`Project`]. The default stage implementations
//! cover a plain configure + make project; targets override only the stages
//! where they differ and can call the free functions in
//! [`crate::core::steps`] to reuse the common behaviour.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::Config;
use crate::core::context::BuildContext;
use crate::core::steps::repository::{self, GitRepository};
use crate::error::Result;
use crate::infra::git;
use crate::infra::process::CommandLine;

/// Where a project keeps its sources, objects and installed files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub source_dir: PathBuf,
    /// `None` for targets that produce nothing in a build directory
    pub build_dir: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
}

impl ProjectLayout {
    /// `<source_root>/<name>` built out of tree in `<output_root>/<name>-build`
    pub fn out_of_tree(config: &Config, name: &str) -> Self {
        Self {
            source_dir: config.source_root().join(name),
            build_dir: Some(config.output_root().join(format!("{name}-build"))),
            install_dir: None,
        }
    }

    /// Layout for a target that only reads an existing tree
    pub fn without_build_dir(source_dir: PathBuf) -> Self {
        Self {
            source_dir,
            build_dir: None,
            install_dir: None,
        }
    }

    #[must_use]
    pub fn with_build_dir(mut self, build_dir: PathBuf) -> Self {
        self.build_dir = Some(build_dir);
        self
    }

    #[must_use]
    pub fn with_install_dir(mut self, install_dir: PathBuf) -> Self {
        self.install_dir = Some(install_dir);
        self
    }

    pub fn build_dir(&self) -> Option<&Path> {
        self.build_dir.as_deref()
    }

    pub fn install_dir(&self) -> Option<&Path> {
        self.install_dir.as_deref()
    }
}

/// Tool that drives the compile and install stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTool {
    Make,
    /// GNU make where the host make is BSD make
    GnuMake,
    Ninja,
}

impl BuildTool {
    pub fn program(self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::GnuMake => "gmake",
            Self::Ninja => "ninja",
        }
    }

    pub fn command(self) -> CommandLine {
        CommandLine::new(self.program())
    }
}

/// A named unit of work moving through update, clean, configure, compile and
/// install
#[async_trait]
pub trait Project: Send + Sync {
    /// Target name used on the command line
    fn name(&self) -> &str;

    fn layout(&self) -> &ProjectLayout;

    /// Source repositories kept up to date by the update stage
    fn repositories(&self) -> &[GitRepository] {
        &[]
    }

    fn build_tool(&self) -> BuildTool {
        BuildTool::Make
    }

    /// Command run in the build directory by the configure stage
    fn configure_command(&self) -> Option<CommandLine> {
        None
    }

    /// Fetch or refresh the sources
    async fn update(&self, ctx: &BuildContext) -> Result<()> {
        repository::sync_all(ctx, self.repositories()).await
    }

    /// Empty the build directory, leaving it in place
    async fn clean(&self, ctx: &BuildContext) -> Result<()> {
        clean_build_dir(ctx, self.layout()).await
    }

    async fn configure(&self, ctx: &BuildContext) -> Result<()> {
        let (Some(command), Some(build_dir)) = (self.configure_command(), self.layout().build_dir())
        else {
            return Ok(());
        };
        ctx.shell().run(&command.current_dir(build_dir)).await
    }

    /// `<tool> -jN` in the build directory
    async fn compile(&self, ctx: &BuildContext) -> Result<()> {
        let Some(build_dir) = self.layout().build_dir() else {
            return Ok(());
        };
        let command = self
            .build_tool()
            .command()
            .arg(ctx.config().jobs_flag())
            .current_dir(build_dir);
        ctx.shell().run(&command).await
    }

    /// `<tool> install` in the build directory
    async fn install(&self, ctx: &BuildContext) -> Result<()> {
        let Some(build_dir) = self.layout().build_dir() else {
            return Ok(());
        };
        let command = self.build_tool().command().arg("install").current_dir(build_dir);
        ctx.shell().run(&command).await
    }
}

/// Empty the build directory of `layout`
///
/// A build directory that is itself a checkout is cleaned with git so the
/// repository metadata survives.
pub async fn clean_build_dir(ctx: &BuildContext, layout: &ProjectLayout) -> Result<()> {
    let Some(build_dir) = layout.build_dir() else {
        return Ok(());
    };
    if git::is_repository(build_dir) {
        ctx.shell().run(&git::clean_all(build_dir)).await
    } else {
        ctx.clean_dir(build_dir, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;

    fn config() -> Config {
        Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("/work/cheri")),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_out_of_tree_layout() {
        let layout = ProjectLayout::out_of_tree(&config(), "qemu");
        assert_eq!(layout.source_dir, PathBuf::from("/work/cheri/qemu"));
        assert_eq!(
            layout.build_dir(),
            Some(Path::new("/work/cheri/output/qemu-build"))
        );
        assert!(layout.install_dir().is_none());
    }

    #[test]
    fn test_layout_builders() {
        let layout = ProjectLayout::without_build_dir(PathBuf::from("/rootfs"))
            .with_install_dir(PathBuf::from("/prefix"));
        assert!(layout.build_dir().is_none());
        assert_eq!(layout.install_dir(), Some(Path::new("/prefix")));

        let layout = layout.with_build_dir(PathBuf::from("/obj"));
        assert_eq!(layout.build_dir(), Some(Path::new("/obj")));
    }

    #[test]
    fn test_build_tool_programs() {
        assert_eq!(BuildTool::Make.program(), "make");
        assert_eq!(BuildTool::GnuMake.program(), "gmake");
        assert_eq!(BuildTool::Ninja.command().to_string(), "ninja");
    }
}
