//! Platform-specific directory management
//!
//! Locates the configuration directory holding `config.toml`.
//!
//! The `CHERIBUILD_CONFIG_DIR` environment variable overrides the platform
//! default (`$XDG_CONFIG_HOME/cheribuild` or `~/.config/cheribuild` on Linux,
//! `~/Library/Application Support/cheribuild` on macOS).

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "CHERIBUILD_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "cheribuild";

/// Name of the configuration file inside the config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory provider for cheribuild
#[derive(Debug, Clone)]
pub struct CheribuildDirs {
    config_dir: PathBuf,
}

impl CheribuildDirs {
    /// Resolve directories from the environment or platform defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path to `config.toml` in the config directory
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Some(path) = env::var_os(ENV_CONFIG_DIR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for CheribuildDirs {
    fn default() -> Self {
        Self::new()
    }
}
