//! Common test utilities and helpers
//!
//! Runs the built binary against a scratch source root with its own config
//! directory, so the user's `config.toml` and environment never leak in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use assert_fs::TempDir;

/// Scratch directories for one cheribuild invocation
pub struct TestWorkspace {
    /// Parent of the source root; must stay empty in pretend mode
    pub dir: TempDir,
    /// Holds `config.toml`
    pub config_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            config_dir: TempDir::new().expect("Failed to create config directory"),
        }
    }

    /// Source root passed with `--source-root`
    pub fn source_root(&self) -> PathBuf {
        self.dir.path().join("cheri")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `config.toml` into the config directory
    #[allow(dead_code)]
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_dir.path().join("config.toml"), content)
            .expect("Failed to write config file");
    }

    /// Number of entries directly inside the workspace
    #[allow(dead_code)]
    pub fn entry_count(&self) -> usize {
        std::fs::read_dir(self.path())
            .expect("Failed to read workspace")
            .count()
    }

    /// Run cheribuild with `args`, without a terminal on stdin
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute cheribuild")
    }

    /// Run cheribuild with `args` after `--source-root <workspace>/cheri`
    pub fn run_in_source_root(&self, args: &[&str]) -> Output {
        let source_root = self.source_root();
        self.command(&["--source-root", source_root.to_str().expect("utf-8 path")])
            .args(args)
            .output()
            .expect("Failed to execute cheribuild")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cheribuild"));
        cmd.current_dir(self.path())
            .args(args)
            .env("CHERIBUILD_CONFIG_DIR", self.config_dir.path())
            .env("NO_COLOR", "1")
            .env_remove("CHERIBUILD_SOURCE_ROOT")
            .env_remove("CHERIBUILD_OUTPUT_ROOT")
            .env_remove("CHERIBUILD_JOBS")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Byte offset of `needle` in `haystack`, panicking with context if absent
#[allow(dead_code)]
pub fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found in output:\n{haystack}"))
}
