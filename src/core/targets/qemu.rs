//! QEMU with the CHERI MIPS target, installed into the host tools prefix

use async_trait::async_trait;

use crate::config::{urls, Config};
use crate::core::context::BuildContext;
use crate::core::project::{BuildTool, Project, ProjectLayout};
use crate::core::steps::repository::{self, GitRepository};
use crate::error::Result;
use crate::infra::git;
use crate::infra::process::CommandLine;

pub struct Qemu {
    layout: ProjectLayout,
    repositories: Vec<GitRepository>,
}

impl Qemu {
    pub const NAME: &'static str = "qemu";

    pub fn new(config: &Config) -> Self {
        let layout =
            ProjectLayout::out_of_tree(config, Self::NAME).with_install_dir(config.host_tools_dir());
        let repositories = vec![GitRepository::new(urls::QEMU_REPO, &layout.source_dir)];
        Self {
            layout,
            repositories,
        }
    }
}

#[async_trait]
impl Project for Qemu {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    fn repositories(&self) -> &[GitRepository] {
        &self.repositories
    }

    // BSD make cannot build qemu
    fn build_tool(&self) -> BuildTool {
        BuildTool::GnuMake
    }

    fn configure_command(&self) -> Option<CommandLine> {
        let prefix = self.layout.install_dir()?;
        Some(
            CommandLine::new(self.layout.source_dir.join("configure").display().to_string())
                .args([
                    "--target-list=cheri-softmmu",
                    "--disable-linux-user",
                    "--disable-linux-aio",
                    "--disable-kvm",
                    "--disable-xen",
                    "--extra-cflags=-g",
                ])
                .arg(format!("--prefix={}", prefix.display())),
        )
    }

    /// The build rewrites `po/`, so restore it before pulling
    async fn update(&self, ctx: &BuildContext) -> Result<()> {
        let source_dir = &self.layout.source_dir;
        if source_dir.join("po").is_dir() {
            ctx.shell().run(&git::checkout_head(source_dir, "po/")).await?;
        }
        repository::sync_all(ctx, &self.repositories).await
    }
}
