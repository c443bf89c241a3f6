//! Shared state handed to every lifecycle step
//!
//! A [`BuildContext`] carries the immutable [`Config`] together with the
//! command runners derived from it, the environment exported to every later
//! command, and the pretend-aware filesystem helpers that projects use
//! instead of touching the filesystem directly.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{CheribuildError, Result, UserInputError};
use crate::infra::filesystem;
use crate::infra::multiplexer::OutputMultiplexer;
use crate::infra::process::{echo_command, mkdir_line, shell_quote, SessionEnv, Shell};
use crate::infra::prompt;

/// Configuration plus the runners built from it
#[derive(Debug, Clone)]
pub struct BuildContext {
    config: Arc<Config>,
    env: SessionEnv,
    shell: Shell,
    multiplexer: OutputMultiplexer,
}

impl BuildContext {
    pub fn new(config: Arc<Config>) -> Self {
        let env = SessionEnv::default();
        let shell = Shell::new(&config, env.clone());
        let multiplexer = OutputMultiplexer::new(&config, env.clone());
        Self {
            config,
            env,
            shell,
            multiplexer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runner for short commands
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Runner for long builds whose output should be logged and condensed
    pub fn multiplexer(&self) -> &OutputMultiplexer {
        &self.multiplexer
    }

    /// Set `key` for every command run from now on, by either runner
    pub fn export_env(&self, key: &str, value: &str) {
        tracing::info!("Set {key} to {value}");
        self.env.set(key, value);
    }

    /// Variables exported so far
    pub fn exported_env(&self) -> Vec<(String, String)> {
        self.env.vars()
    }

    /// Report a fatal condition
    ///
    /// Returns the error, except in pretend mode where it is printed as a
    /// warning so the rest of the simulated run can still be shown.
    pub fn fatal_error(&self, error: impl Into<CheribuildError>) -> Result<()> {
        let error = error.into();
        if self.config.pretend() {
            tracing::warn!("ignoring fatal error in pretend mode: {error}");
            println!("Potential fatal error: {error}");
            Ok(())
        } else {
            Err(error)
        }
    }

    /// `mkdir -p path`
    pub fn make_dirs(&self, path: &Path) -> Result<()> {
        echo_command(&mkdir_line(path), None);
        if !self.config.pretend() {
            filesystem::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Empty `path` when cleaning was requested (or `force` is set), then make
    /// sure it exists
    pub fn clean_dir(&self, path: &Path, force: bool) -> Result<()> {
        if (self.config.clean() || force) && path.is_dir() {
            echo_command(&format!("rm -rf {}", quote_path(path)), None);
            if !self.config.pretend() {
                filesystem::remove_dir_all(path)?;
            }
        }
        self.make_dirs(path)
    }

    /// `rm path`
    pub fn remove_file(&self, path: &Path) -> Result<()> {
        echo_command(&format!("rm {}", quote_path(path)), None);
        if !self.config.pretend() {
            filesystem::remove_file(path)?;
        }
        Ok(())
    }

    /// Write a generated file, asking before replacing different contents
    ///
    /// Without a terminal an existing file is replaced with a warning.
    pub fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        echo_command(
            &format!(
                "echo {} > {}",
                shell_quote(&contents.replace('\n', "\\n")),
                quote_path(path)
            ),
            None,
        );
        if self.config.pretend() {
            return Ok(());
        }

        let contents = format!("{contents}\n");
        if path.is_file() {
            let old = filesystem::read_file(path)?;
            if old == contents {
                tracing::debug!("{} is already up to date", path.display());
                return Ok(());
            }
            println!(
                "Overwriting old file {} - contents:\n\n{old}\n",
                path.display()
            );
            match prompt::confirm("Continue?", true) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(UserInputError::Declined {
                        action: format!("Overwriting {}", path.display()),
                    }
                    .into())
                }
                Err(UserInputError::NonInteractive { .. }) => {
                    tracing::warn!("replacing {} without confirmation", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }
        filesystem::write_file(path, &contents)?;
        Ok(())
    }
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.display().to_string()).into_owned()
}
