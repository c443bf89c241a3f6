//! Resolved build configuration
//!
//! [`Config`] is built once at startup from [`ConfigOptions`] and never
//! mutated afterwards. Every derived location is a plain composition of the
//! four root paths.

pub mod defaults;
pub mod urls;

use std::path::{Path, PathBuf};

use crate::error::EnvironmentError;
use crate::infra::filesystem;
use crate::infra::process::{echo_command, mkdir_line};

/// Target name that selects every known project
pub const ALL_TARGETS: &str = "all";

/// Raw settings as collected from the command line and the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Where all sources are checked out
    pub source_root: Option<PathBuf>,
    /// Where build artifacts go
    pub output_root: Option<PathBuf>,
    /// Additional files for the disk image
    pub extra_files: Option<PathBuf>,
    /// Output path of the disk image
    pub disk_image: Option<PathBuf>,
    /// Parallel jobs for the delegated build tools
    pub jobs: Option<usize>,
    /// Print commands instead of running them
    pub pretend: bool,
    /// Send command output to the log only
    pub quiet: bool,
    /// Clean build directories before building
    pub clean: bool,
    /// Skip the source update step
    pub skip_update: bool,
    /// Skip the configure step
    pub skip_configure: bool,
    /// List targets and exit
    pub list_targets: bool,
    /// Requested target names
    pub targets: Vec<String>,
}

/// Immutable, fully resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    source_root: PathBuf,
    output_root: PathBuf,
    extra_files: PathBuf,
    disk_image: PathBuf,
    jobs: usize,
    pretend: bool,
    quiet: bool,
    clean: bool,
    skip_update: bool,
    skip_configure: bool,
    list_targets: bool,
    targets: Vec<String>,
}

impl Config {
    /// Resolve options into a configuration without touching the filesystem
    pub fn from_options(options: ConfigOptions) -> Result<Self, EnvironmentError> {
        let source_root = match options.source_root {
            Some(path) => absolute(&path)?,
            None => default_source_root()?,
        };
        let output_root = match options.output_root {
            Some(path) => absolute(&path)?,
            None => source_root.join(defaults::OUTPUT_DIR_NAME),
        };
        let extra_files = match options.extra_files {
            Some(path) => absolute(&path)?,
            None => source_root.join(defaults::EXTRA_FILES_DIR_NAME),
        };
        let disk_image = match options.disk_image {
            Some(path) => absolute(&path)?,
            None => output_root.join(defaults::DISK_IMAGE_NAME),
        };

        let targets = if options.targets.is_empty() {
            vec![ALL_TARGETS.to_string()]
        } else {
            options.targets
        };

        Ok(Self {
            source_root,
            output_root,
            extra_files,
            disk_image,
            jobs: options.jobs.unwrap_or_else(defaults::default_jobs).max(1),
            pretend: options.pretend,
            quiet: options.quiet,
            clean: options.clean,
            skip_update: options.skip_update,
            skip_configure: options.skip_configure,
            list_targets: options.list_targets,
            targets,
        })
    }

    /// Create the source, output and extra-files roots
    ///
    /// Directory creation is echoed in every mode but only performed
    /// outside pretend mode.
    pub fn create_root_directories(&self) -> Result<(), EnvironmentError> {
        tracing::info!("Sources will be stored in {}", self.source_root.display());
        tracing::info!("Build artifacts will be stored in {}", self.output_root.display());
        tracing::info!(
            "Extra files for disk image will be searched for in {}",
            self.extra_files.display()
        );
        tracing::info!("Disk image will be saved to {}", self.disk_image.display());

        for dir in [&self.source_root, &self.output_root, &self.extra_files] {
            echo_command(&mkdir_line(dir), None);
            if !self.pretend {
                filesystem::create_dir_all(dir).map_err(|e| EnvironmentError::Io {
                    path: dir.clone(),
                    error: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn extra_files(&self) -> &Path {
        &self.extra_files
    }

    pub fn disk_image(&self) -> &Path {
        &self.disk_image
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// The `-jN` flag handed to make and ninja
    pub fn jobs_flag(&self) -> String {
        format!("-j{}", self.jobs)
    }

    pub fn pretend(&self) -> bool {
        self.pretend
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn clean(&self) -> bool {
        self.clean
    }

    pub fn skip_update(&self) -> bool {
        self.skip_update
    }

    pub fn skip_configure(&self) -> bool {
        self.skip_configure
    }

    pub fn list_targets(&self) -> bool {
        self.list_targets
    }

    /// Requested target names, `["all"]` when none were given
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Installed CheriBSD tree that becomes the disk image
    pub fn rootfs(&self) -> PathBuf {
        self.output_root.join(defaults::ROOTFS_DIR_NAME)
    }

    pub fn cheribsd_sources(&self) -> PathBuf {
        self.source_root.join(defaults::CHERIBSD_DIR_NAME)
    }

    pub fn cheribsd_obj(&self) -> PathBuf {
        self.output_root.join(defaults::CHERIBSD_OBJ_DIR_NAME)
    }

    /// Install prefix for qemu, binutils and llvm
    pub fn host_tools_dir(&self) -> PathBuf {
        self.output_root.join(defaults::HOST_TOOLS_DIR_NAME)
    }

    pub fn host_tools_bin(&self) -> PathBuf {
        self.host_tools_dir().join("bin")
    }

    /// mtree manifest of the installed rootfs
    pub fn manifest_file(&self) -> PathBuf {
        self.rootfs().join(defaults::MANIFEST_FILE_NAME)
    }

    /// Directory holding `master.passwd` and `group` for unprivileged installs
    pub fn user_group_db(&self) -> PathBuf {
        self.cheribsd_sources().join("etc")
    }

    /// `PATH` with the host tools prepended, for commands that need the new binutils
    pub fn path_with_host_tools(&self) -> String {
        let bin = self.host_tools_bin();
        match std::env::var_os("PATH") {
            Some(path) if !path.is_empty() => {
                let mut dirs = vec![bin];
                dirs.extend(std::env::split_paths(&path).filter(|p| *p != self.host_tools_bin()));
                std::env::join_paths(dirs)
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| {
                        format!("{}:{}", self.host_tools_bin().display(), path.to_string_lossy())
                    })
            }
            _ => bin.display().to_string(),
        }
    }
}

fn default_source_root() -> Result<PathBuf, EnvironmentError> {
    dirs::home_dir()
        .map(|home| home.join(defaults::DEFAULT_SOURCE_DIR_NAME))
        .ok_or_else(|| EnvironmentError::MissingArtifact {
            what: "Home directory".to_string(),
            path: PathBuf::from("~"),
        })
}

fn absolute(path: &Path) -> Result<PathBuf, EnvironmentError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| EnvironmentError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options_in(root: &Path) -> ConfigOptions {
        ConfigOptions {
            source_root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_paths_follow_roots() {
        let config = Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("/src")),
            jobs: Some(4),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.output_root(), Path::new("/src/output"));
        assert_eq!(config.extra_files(), Path::new("/src/extra-files"));
        assert_eq!(config.disk_image(), Path::new("/src/output/disk.img"));
        assert_eq!(config.rootfs(), PathBuf::from("/src/output/rootfs"));
        assert_eq!(config.cheribsd_sources(), PathBuf::from("/src/cheribsd"));
        assert_eq!(config.cheribsd_obj(), PathBuf::from("/src/output/cheribsd-obj"));
        assert_eq!(config.host_tools_dir(), PathBuf::from("/src/output/host-tools"));
        assert_eq!(
            config.manifest_file(),
            PathBuf::from("/src/output/rootfs/METALOG")
        );
        assert_eq!(config.user_group_db(), PathBuf::from("/src/cheribsd/etc"));
        assert_eq!(config.jobs_flag(), "-j4");
    }

    #[test]
    fn test_explicit_roots_override_defaults() {
        let config = Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("/src")),
            output_root: Some(PathBuf::from("/out")),
            disk_image: Some(PathBuf::from("/images/cheri.img")),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.output_root(), Path::new("/out"));
        assert_eq!(config.rootfs(), PathBuf::from("/out/rootfs"));
        assert_eq!(config.disk_image(), Path::new("/images/cheri.img"));
        // extra files follow the source root, not the output root
        assert_eq!(config.extra_files(), Path::new("/src/extra-files"));
    }

    #[test]
    fn test_targets_default_to_all() {
        let config = Config::from_options(options_in(Path::new("/src"))).unwrap();
        assert_eq!(config.targets(), ["all".to_string()]);
    }

    #[test]
    fn test_relative_roots_become_absolute() {
        let config = Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("relative/src")),
            ..Default::default()
        })
        .unwrap();
        assert!(config.source_root().is_absolute());
        assert!(config.source_root().ends_with("relative/src"));
    }

    #[test]
    fn test_zero_jobs_is_clamped() {
        let config = Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("/src")),
            jobs: Some(0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.jobs(), 1);
    }

    #[test]
    fn test_creates_root_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cheri");

        let config = Config::from_options(options_in(&root)).unwrap();
        config.create_root_directories().unwrap();

        assert!(config.source_root().is_dir());
        assert!(config.output_root().is_dir());
        assert!(config.extra_files().is_dir());
    }

    #[test]
    fn test_root_directories_are_idempotent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cheri");

        let config = Config::from_options(options_in(&root)).unwrap();
        config.create_root_directories().unwrap();
        config.create_root_directories().unwrap();

        assert!(root.join("output").is_dir());
    }

    #[test]
    fn test_pretend_mode_creates_no_root_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cheri");

        let config = Config::from_options(ConfigOptions {
            pretend: true,
            ..options_in(&root)
        })
        .unwrap();
        config.create_root_directories().unwrap();

        assert!(config.pretend());
        assert!(!root.exists());
    }

    #[test]
    fn test_path_with_host_tools_starts_with_bin() {
        let config = Config::from_options(options_in(Path::new("/src"))).unwrap();
        let path = config.path_with_host_tools();
        assert!(path.starts_with("/src/output/host-tools/bin"));
    }
}
