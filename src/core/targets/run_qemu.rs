//! Boot the disk image in the CHERI emulator

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::Config;
use crate::core::context::BuildContext;
use crate::core::project::{Project, ProjectLayout};
use crate::error::Result;
use crate::infra::process::CommandLine;

/// Host port forwarded to the guest's sshd
const SSH_FORWARD: &str = "tcp:9999::22";

pub struct RunQemu {
    layout: ProjectLayout,
    qemu: PathBuf,
    kernel: PathBuf,
    image: PathBuf,
}

impl RunQemu {
    pub const NAME: &'static str = "run";

    pub fn new(config: &Config) -> Self {
        let rootfs = config.rootfs();
        Self {
            kernel: rootfs.join("boot/kernel/kernel"),
            layout: ProjectLayout::without_build_dir(rootfs),
            qemu: config.host_tools_bin().join("qemu-system-cheri"),
            image: config.disk_image().to_path_buf(),
        }
    }

    pub fn qemu_command(&self) -> CommandLine {
        CommandLine::new(self.qemu.display().to_string())
            .args(["-M", "malta", "-kernel"])
            .path_arg(&self.kernel)
            .args(["-nographic", "-m", "2048", "-hda"])
            .path_arg(&self.image)
            .args(["-net", "nic", "-net", "user", "-redir", SSH_FORWARD])
    }
}

#[async_trait]
impl Project for RunQemu {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// The emulator console needs stdout, even with `--quiet`
    async fn compile(&self, ctx: &BuildContext) -> Result<()> {
        println!(
            "About to run QEMU with image {} and kernel {}",
            self.image.display(),
            self.kernel.display()
        );
        ctx.shell().run_foreground(&self.qemu_command()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;

    #[test]
    fn test_qemu_command() {
        let config = Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("/c")),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            RunQemu::new(&config).qemu_command().to_string(),
            "/c/output/host-tools/bin/qemu-system-cheri -M malta -kernel \
             /c/output/rootfs/boot/kernel/kernel -nographic -m 2048 -hda /c/output/disk.img \
             -net nic -net user -redir tcp:9999::22"
        );
    }
}
