//! Bootable UFS image built from the rootfs manifest
//!
//! `makefs` reads ownership from `METALOG` and the CheriBSD user database,
//! so no root privileges are needed.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::Config;
use crate::core::context::BuildContext;
use crate::core::project::{Project, ProjectLayout};
use crate::error::{EnvironmentError, Result, UserInputError};
use crate::infra::process::CommandLine;
use crate::infra::prompt;

pub struct DiskImage {
    layout: ProjectLayout,
    image: PathBuf,
    manifest: PathBuf,
    user_group_db: PathBuf,
}

impl DiskImage {
    pub const NAME: &'static str = "disk-image";

    pub fn new(config: &Config) -> Self {
        Self {
            layout: ProjectLayout::without_build_dir(config.rootfs()),
            image: config.disk_image().to_path_buf(),
            manifest: config.manifest_file(),
            user_group_db: config.user_group_db(),
        }
    }

    pub fn makefs_command(&self) -> CommandLine {
        CommandLine::new("makefs")
            .args([
                // minimum free blocks and inodes
                "-b", "70%", "-f", "30%",
                // minimum image size
                "-M", "4g",
                "-B", "be",
            ])
            .arg("-F")
            .path_arg(&self.manifest)
            .arg("-N")
            .path_arg(&self.user_group_db)
            .path_arg(&self.image)
            .path_arg(&self.layout.source_dir)
    }

    /// Remove an existing image, asking first when someone can answer
    fn remove_old_image(&self, ctx: &BuildContext) -> Result<()> {
        if !self.image.is_file() {
            return Ok(());
        }
        if !ctx.config().pretend() && prompt::is_interactive() {
            let question = format!(
                "An image already exists ({}). Overwrite?",
                self.image.display()
            );
            if !prompt::confirm(&question, true)? {
                return Err(UserInputError::Declined {
                    action: format!("Overwriting {}", self.image.display()),
                }
                .into());
            }
        }
        ctx.remove_file(&self.image)
    }
}

#[async_trait]
impl Project for DiskImage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    async fn compile(&self, ctx: &BuildContext) -> Result<()> {
        self.remove_old_image(ctx)?;
        if !self.manifest.is_file() {
            ctx.fatal_error(EnvironmentError::MissingArtifact {
                what: "mtree manifest".to_string(),
                path: self.manifest.clone(),
            })?;
        }
        let passwd = self.user_group_db.join("master.passwd");
        if !passwd.is_file() {
            ctx.fatal_error(EnvironmentError::MissingArtifact {
                what: "master.passwd".to_string(),
                path: passwd,
            })?;
        }
        ctx.shell().run(&self.makefs_command()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;
    use crate::error::CheribuildError;
    use crate::test_utils::test_context;
    use tempfile::TempDir;

    #[test]
    fn test_makefs_command() {
        let config = Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("/c")),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            DiskImage::new(&config).makefs_command().to_string(),
            "makefs -b 70% -f 30% -M 4g -B be -F /c/output/rootfs/METALOG -N /c/cheribsd/etc \
             /c/output/disk.img /c/output/rootfs"
        );
    }

    #[tokio::test]
    async fn test_missing_manifest_is_fatal() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(temp.path(), ConfigOptions::default());
        let image = DiskImage::new(ctx.config());

        let err = image.compile(&ctx).await.unwrap_err();

        assert!(matches!(
            err,
            CheribuildError::Environment(EnvironmentError::MissingArtifact { .. })
        ));
    }

    #[tokio::test]
    async fn test_pretend_keeps_existing_image() {
        let temp = TempDir::new().unwrap();
        let ctx = test_context(
            temp.path(),
            ConfigOptions {
                pretend: true,
                ..Default::default()
            },
        );
        std::fs::create_dir_all(temp.path().join("output")).unwrap();
        std::fs::write(temp.path().join("output/disk.img"), "image").unwrap();
        let image = DiskImage::new(ctx.config());

        image.compile(&ctx).await.unwrap();

        assert!(temp.path().join("output/disk.img").exists());
    }
}
