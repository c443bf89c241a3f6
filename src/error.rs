//! Error types for cheribuild
//!
//! Domain-specific error types using thiserror. Every error is fatal to the
//! whole run; the only softening happens in pretend mode through
//! [`crate::core::context::BuildContext::fatal_error`].

use std::path::PathBuf;
use thiserror::Error;

use crate::core::global_config::GlobalConfigError;
use crate::core::lifecycle::Stage;

/// Errors caused by what the user asked for (or declined)
#[derive(Error, Debug)]
pub enum UserInputError {
    /// One or more requested targets are unknown
    #[error(
        "Invalid target(s): {}\nThe following targets exist: {}\ntarget 'all' can be used to build everything",
        invalid.join(", "),
        valid.join(", ")
    )]
    InvalidTargets {
        invalid: Vec<String>,
        valid: Vec<String>,
    },

    /// Sources are not checked out and we may not clone them
    #[error("Sources for '{path}' missing!")]
    MissingSources { path: PathBuf },

    /// The user answered no to a prompt
    #[error("{action} cancelled by user")]
    Declined { action: String },

    /// A question needs an answer but stdin is not a terminal
    #[error("Cannot ask '{question}' in non-interactive mode")]
    NonInteractive { question: String },
}

/// A delegated command failed
#[derive(Error, Debug)]
pub enum ExternalToolError {
    /// Command exited with a non-zero status
    #[error(
        "Command \"{command}\" failed with exit code {code}.{}",
        see_log(log.as_ref())
    )]
    Failed {
        command: String,
        code: i32,
        log: Option<PathBuf>,
    },

    /// Command was killed by a signal
    #[error(
        "Command \"{command}\" was terminated by {}.{}",
        signal.map_or_else(|| "a signal".to_string(), |n| format!("signal {n}")),
        see_log(log.as_ref())
    )]
    Terminated {
        command: String,
        signal: Option<i32>,
        log: Option<PathBuf>,
    },

    /// Command could not be started
    #[error("Failed to start \"{command}\": {error}")]
    Spawn { command: String, error: String },
}

impl ExternalToolError {
    /// Path of the persisted log, if the command ran through the multiplexer
    pub fn log_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Failed { log, .. } | Self::Terminated { log, .. } => log.as_ref(),
            Self::Spawn { .. } => None,
        }
    }
}

fn see_log(log: Option<&PathBuf>) -> String {
    log.map(|p| format!("\nSee {} for details.", p.display()))
        .unwrap_or_default()
}

/// Something the host or a previous step should have provided is missing
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// Host program not found
    #[error("Required program '{tool}' was not found in PATH")]
    MissingTool { tool: String },

    /// Expected file or directory not found
    #[error("{what} is missing: {path}")]
    MissingArtifact { what: String, path: PathBuf },

    /// A built-in match pattern failed to compile
    #[error("Invalid pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    /// IO error while preparing the environment
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Top-level cheribuild error type
#[derive(Error, Debug)]
pub enum CheribuildError {
    /// User input error
    #[error(transparent)]
    UserInput(#[from] UserInputError),

    /// External tool failure
    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),

    /// Environment error
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(#[from] GlobalConfigError),

    /// A lifecycle stage of a target failed
    #[error("Target '{target}' failed during {stage} (last completed: {last_completed}): {source}")]
    TargetFailed {
        target: String,
        stage: Stage,
        last_completed: Stage,
        #[source]
        source: Box<CheribuildError>,
    },
}

/// Result alias used by the core and infrastructure layers
pub type Result<T, E = CheribuildError> = std::result::Result<T, E>;
