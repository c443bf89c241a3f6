//! Configuration file support
//!
//! Reads `config.toml` from the config directory (or an explicit path).
//! Values in the file act as defaults underneath the command line: a path or
//! job count given on the command line always wins, and boolean switches
//! enabled in either place are enabled.
//!
//! ```toml
//! [paths]
//! source_root = "/work/cheri"
//!
//! [build]
//! jobs = 8
//! skip_update = true
//! ```

use crate::config::ConfigOptions;
use crate::infra::dirs::CheribuildDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Root directories
    #[serde(default)]
    pub paths: PathsConfig,

    /// Default build options
    #[serde(default)]
    pub build: BuildConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Root directory defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub source_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub extra_files: Option<PathBuf>,
    pub disk_image: Option<PathBuf>,
}

/// Default build options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Default number of parallel jobs
    pub jobs: Option<usize>,

    /// Never pull sources
    pub skip_update: Option<bool>,

    /// Never rerun configure
    pub skip_configure: Option<bool>,
}

/// Output preferences
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Keep command output in the logs only
    pub quiet: Option<bool>,
}

impl GlobalConfig {
    /// Load `config.toml` from the config directory
    ///
    /// A missing file yields the default configuration.
    pub fn load(dirs: &CheribuildDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the file exists but
    /// contains invalid TOML or unknown keys.
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Fill the gaps in command-line `options` with values from this file
    #[must_use]
    pub fn apply_to(&self, options: ConfigOptions) -> ConfigOptions {
        ConfigOptions {
            source_root: options.source_root.or_else(|| self.paths.source_root.clone()),
            output_root: options.output_root.or_else(|| self.paths.output_root.clone()),
            extra_files: options.extra_files.or_else(|| self.paths.extra_files.clone()),
            disk_image: options.disk_image.or_else(|| self.paths.disk_image.clone()),
            jobs: options.jobs.or(self.build.jobs),
            quiet: options.quiet || self.output.quiet.unwrap_or(false),
            skip_update: options.skip_update || self.build.skip_update.unwrap_or(false),
            skip_configure: options.skip_configure || self.build.skip_configure.unwrap_or(false),
            ..options
        }
    }
}
