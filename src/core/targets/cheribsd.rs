//! CheriBSD world and kernel, installed unprivileged into the rootfs
//!
//! `buildworld` and `buildkernel` take hours and print hundreds of thousands
//! of lines, so they go through the output multiplexer. The install targets
//! are run the same way but without parallelism.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::{urls, Config};
use crate::core::context::BuildContext;
use crate::core::project::{Project, ProjectLayout};
use crate::core::steps::manifest::ManifestInstaller;
use crate::core::steps::repository::GitRepository;
use crate::error::{EnvironmentError, Result};
use crate::infra::process::CommandLine;

const KERNEL_CONFIG: &str = "CHERI_MALTA64";

const FSTAB: &str = "/dev/ada0 / ufs rw 1 1";

pub struct CheriBsd {
    layout: ProjectLayout,
    repositories: Vec<GitRepository>,
    rootfs: PathBuf,
    cheri_cc: PathBuf,
    search_path: String,
    jobs_flag: String,
    manifest: ManifestInstaller,
}

impl CheriBsd {
    pub const NAME: &'static str = "cheribsd";

    pub fn new(config: &Config) -> Self {
        let rootfs = config.rootfs();
        let layout = ProjectLayout::without_build_dir(config.cheribsd_sources())
            .with_build_dir(config.cheribsd_obj())
            .with_install_dir(rootfs.clone());
        let repositories = vec![GitRepository::new(
            urls::CHERIBSD_REPO,
            layout.source_dir.clone(),
        )];
        Self {
            layout,
            repositories,
            rootfs,
            cheri_cc: config.host_tools_bin().join("clang"),
            search_path: config.path_with_host_tools(),
            jobs_flag: config.jobs_flag(),
            manifest: ManifestInstaller::new(config),
        }
    }

    /// `make` with the flags shared by every build and install target
    pub fn make_command(&self) -> CommandLine {
        CommandLine::new("make")
            .arg("CHERI=256")
            .arg(format!("CHERI_CC={}", self.cheri_cc.display()))
            .args([
                // use the passwd file from the sources, not the host's
                "-DDB_FROM_SRC",
                "-DNO_ROOT",
                "-DNO_WERROR",
                // cleaning is up to --clean
                "-DNO_CLEAN",
                "DEBUG_FLAGS=-g",
            ])
            .arg(format!("DESTDIR={}", self.rootfs.display()))
            .arg(format!("KERNCONF={KERNEL_CONFIG}"))
    }

    async fn run_make(&self, ctx: &BuildContext, target: &str, parallel: bool) -> Result<()> {
        let Some(build_dir) = self.layout.build_dir() else {
            return Ok(());
        };
        let mut command = self.make_command();
        if parallel {
            command = command.arg(&self.jobs_flag);
        }
        let command = command
            .arg(target)
            .current_dir(&self.layout.source_dir)
            .env("MAKEOBJDIRPREFIX", build_dir.display().to_string());
        ctx.multiplexer()
            .run(&command, build_dir, Self::NAME, target)
            .await
    }

    fn rc_conf() -> String {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_else(|_| "user".to_string());
        format!("hostname=\"qemu-cheri-{user}\"\nifconfig_le0=\"DHCP\"\nsshd_enable=\"YES\"")
    }
}

#[async_trait]
impl Project for CheriBsd {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    fn repositories(&self) -> &[GitRepository] {
        &self.repositories
    }

    async fn compile(&self, ctx: &BuildContext) -> Result<()> {
        // later commands (install -M, makefs, the emulator) need the host tools too
        ctx.export_env("PATH", &self.search_path);
        if !self.cheri_cc.is_file() {
            ctx.fatal_error(EnvironmentError::MissingArtifact {
                what: "CHERI CC".to_string(),
                path: self.cheri_cc.clone(),
            })?;
        }
        // a stale rootfs breaks installworld, and DESTDIR must exist
        ctx.clean_dir(&self.rootfs, true)?;
        self.run_make(ctx, "buildworld", true).await?;
        self.run_make(ctx, "buildkernel", true).await
    }

    async fn install(&self, ctx: &BuildContext) -> Result<()> {
        for target in ["installworld", "installkernel", "distribution"] {
            self.run_make(ctx, target, false).await?;
        }
        self.manifest.inject_file(ctx, "etc", "fstab", FSTAB).await?;
        self.manifest
            .inject_file(ctx, "etc", "rc.conf", &Self::rc_conf())
            .await
    }
}
