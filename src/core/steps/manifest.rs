//! Registering files in the rootfs mtree manifest
//!
//! `make installworld -DNO_ROOT` records every installed file in `METALOG`
//! instead of setting owners, so the disk image can be built unprivileged.
//! Files written after that must go through `install -M` too or they would be
//! missing from the image.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::context::BuildContext;
use crate::error::{EnvironmentError, Result};
use crate::infra::process::CommandLine;

/// Owner, group and mode recorded for an injected file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub user: String,
    pub group: String,
    pub mode: String,
}

impl Default for FileMetadata {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            group: "wheel".to_string(),
            mode: "0644".to_string(),
        }
    }
}

/// Adds files to the rootfs and its manifest
#[derive(Debug, Clone)]
pub struct ManifestInstaller {
    rootfs: PathBuf,
    manifest: PathBuf,
    user_group_db: PathBuf,
}

impl ManifestInstaller {
    pub fn new(config: &Config) -> Self {
        Self {
            rootfs: config.rootfs(),
            manifest: config.manifest_file(),
            user_group_db: config.user_group_db(),
        }
    }

    /// `install` invocation copying `file` into `<rootfs>/<target_dir>`
    pub fn install_command(&self, file: &Path, target_dir: &str, meta: &FileMetadata) -> CommandLine {
        CommandLine::new("install")
            .arg("-N")
            .path_arg(&self.user_group_db)
            .arg("-U")
            .arg("-M")
            .path_arg(&self.manifest)
            .arg("-D")
            .path_arg(&self.rootfs)
            .args(["-o", meta.user.as_str(), "-g", meta.group.as_str(), "-m", meta.mode.as_str()])
            .path_arg(file)
            .path_arg(&self.rootfs.join(target_dir))
    }

    /// The manifest and the user database must exist before anything is added
    pub fn check_environment(&self) -> Result<(), EnvironmentError> {
        if !self.manifest.is_file() {
            return Err(EnvironmentError::MissingArtifact {
                what: "mtree manifest".to_string(),
                path: self.manifest.clone(),
            });
        }
        if !self.user_group_db.is_dir() {
            return Err(EnvironmentError::MissingArtifact {
                what: "user/group database".to_string(),
                path: self.user_group_db.clone(),
            });
        }
        Ok(())
    }

    /// Record `file` (already under the rootfs) in the manifest
    pub async fn add_file(
        &self,
        ctx: &BuildContext,
        file: &Path,
        target_dir: &str,
        meta: &FileMetadata,
    ) -> Result<()> {
        if !ctx.config().pretend() {
            self.check_environment()?;
        }
        ctx.shell().run(&self.install_command(file, target_dir, meta)).await
    }

    /// Write `<rootfs>/<target_dir>/<name>` and record it in the manifest
    pub async fn inject_file(
        &self,
        ctx: &BuildContext,
        target_dir: &str,
        name: &str,
        contents: &str,
    ) -> Result<()> {
        let path = self.rootfs.join(target_dir).join(name);
        ctx.write_file(&path, contents)?;
        self.add_file(ctx, &path, target_dir, &FileMetadata::default())
            .await
    }
}
