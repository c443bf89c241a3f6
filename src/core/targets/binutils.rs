//! CHERI binutils, installed into the host tools prefix

use async_trait::async_trait;

use crate::config::{urls, Config};
use crate::core::project::{Project, ProjectLayout};
use crate::core::steps::repository::GitRepository;
use crate::infra::process::CommandLine;

pub struct Binutils {
    layout: ProjectLayout,
    repositories: Vec<GitRepository>,
}

impl Binutils {
    pub const NAME: &'static str = "binutils";

    pub fn new(config: &Config) -> Self {
        let layout =
            ProjectLayout::out_of_tree(config, Self::NAME).with_install_dir(config.host_tools_dir());
        let repositories = vec![GitRepository::new(urls::BINUTILS_REPO, &layout.source_dir)];
        Self {
            layout,
            repositories,
        }
    }
}

#[async_trait]
impl Project for Binutils {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    fn repositories(&self) -> &[GitRepository] {
        &self.repositories
    }

    fn configure_command(&self) -> Option<CommandLine> {
        let prefix = self.layout.install_dir()?;
        Some(
            CommandLine::new(self.layout.source_dir.join("configure").display().to_string())
                .args(["--target=mips64", "--disable-werror"])
                .arg(format!("--prefix={}", prefix.display())),
        )
    }
}
