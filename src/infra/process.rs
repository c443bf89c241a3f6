//! External command execution
//!
//! Commands are described by [`CommandLine`] values and run through a
//! [`Shell`], which echoes every command before running it and only echoes
//! in pretend mode. Variables exported into a [`SessionEnv`] reach every
//! command spawned after the export.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::style::{style, Stylize};

use crate::config::Config;
use crate::error::{CheribuildError, EnvironmentError, ExternalToolError, Result};

/// A program invocation: program, arguments, working directory and
/// environment overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl CommandLine {
    /// Create a command line for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Run inside `dir`
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable for this command only
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.env
    }

    /// Program and arguments, shell-quoted and joined by spaces
    pub fn to_shell_string(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn to_tokio(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_string())
    }
}

/// Environment shared by all commands of one run
///
/// Clones share the same variables. A command's own [`CommandLine::env`]
/// entries win over exported ones.
#[derive(Debug, Clone, Default)]
pub struct SessionEnv {
    vars: Arc<Mutex<Vec<(String, String)>>>,
}

impl SessionEnv {
    /// Export `key` to every command spawned from now on
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut vars = self.lock();
        vars.retain(|(existing, _)| *existing != key);
        vars.push((key, value.into()));
    }

    pub fn vars(&self) -> Vec<(String, String)> {
        self.lock().clone()
    }

    /// `command` with the exported variables added
    pub fn apply(&self, command: &CommandLine) -> CommandLine {
        let mut env: Vec<(String, String)> = self
            .lock()
            .iter()
            .filter(|(key, _)| !command.env.iter().any(|(own, _)| own == key))
            .cloned()
            .collect();
        env.extend(command.env.iter().cloned());
        CommandLine {
            env,
            ..command.clone()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.vars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Quote a word so a POSIX shell reads it back unchanged
pub fn shell_quote(word: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r#"'"'"'"#)))
    }
}

/// `mkdir -p <path>` as echoed before creating a directory
pub fn mkdir_line(path: &Path) -> String {
    format!("mkdir -p {}", shell_quote(&path.display().to_string()))
}

/// Print a command the way a user would type it, highlighted
pub fn echo_command(command: &str, cwd: Option<&Path>) {
    let line = match cwd {
        Some(dir) => format!(
            "cd {} && {command}",
            shell_quote(&dir.display().to_string())
        ),
        None => command.to_string(),
    };
    println!("{}", style(line).yellow().bold());
}

/// Runs commands according to the pretend and quiet flags
#[derive(Debug, Clone)]
pub struct Shell {
    pretend: bool,
    quiet: bool,
    env: SessionEnv,
}

impl Shell {
    pub fn new(config: &Config, env: SessionEnv) -> Self {
        Self {
            pretend: config.pretend(),
            quiet: config.quiet(),
            env,
        }
    }

    /// Print a command without running it
    pub fn echo(&self, command: &CommandLine) {
        tracing::debug!(env = ?command.envs(), "command: {command}");
        echo_command(&command.to_shell_string(), command.cwd());
    }

    /// Echo and run a command; stdout is discarded in quiet mode
    pub async fn run(&self, command: &CommandLine) -> Result<()> {
        self.run_with(command, self.quiet).await
    }

    /// Echo and run a command whose stdout must stay visible even in quiet
    /// mode (e.g. the emulator console)
    pub async fn run_foreground(&self, command: &CommandLine) -> Result<()> {
        self.run_with(command, false).await
    }

    async fn run_with(&self, command: &CommandLine, discard_stdout: bool) -> Result<()> {
        let command = &self.env.apply(command);
        self.echo(command);
        if self.pretend {
            return Ok(());
        }

        let mut child = command.to_tokio();
        if discard_stdout {
            child.stdout(Stdio::null());
        }
        let status = child
            .status()
            .await
            .map_err(|e| spawn_error(command, &e))?;
        check_status(command, status, None)?;
        Ok(())
    }
}

/// Map a failed spawn to an error; a missing program is an environment problem
pub(crate) fn spawn_error(command: &CommandLine, error: &std::io::Error) -> CheribuildError {
    if error.kind() == std::io::ErrorKind::NotFound {
        EnvironmentError::MissingTool {
            tool: command.program().to_string(),
        }
        .into()
    } else {
        ExternalToolError::Spawn {
            command: command.to_shell_string(),
            error: error.to_string(),
        }
        .into()
    }
}

/// Turn a non-zero exit into an [`ExternalToolError`]
pub(crate) fn check_status(
    command: &CommandLine,
    status: ExitStatus,
    log: Option<&Path>,
) -> Result<(), ExternalToolError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(ExternalToolError::Failed {
            command: command.to_shell_string(),
            code,
            log: log.map(Path::to_path_buf),
        }),
        None => Err(ExternalToolError::Terminated {
            command: command.to_shell_string(),
            signal: terminating_signal(status),
            log: log.map(Path::to_path_buf),
        }),
    }
}

#[cfg(unix)]
fn terminating_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: ExitStatus) -> Option<i32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;

    fn shell(pretend: bool) -> Shell {
        let config = Config::from_options(ConfigOptions {
            source_root: Some(PathBuf::from("/src")),
            pretend,
            ..Default::default()
        })
        .unwrap();
        Shell::new(&config, SessionEnv::default())
    }

    #[test]
    fn test_shell_quote_plain_words_untouched() {
        assert_eq!(shell_quote("--target=mips64"), "--target=mips64");
        assert_eq!(shell_quote("/home/user/cheri"), "/home/user/cheri");
    }

    #[test]
    fn test_shell_quote_special_words() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote("lib/std*"), "'lib/std*'");
    }

    #[test]
    fn test_mkdir_line_quotes_path() {
        assert_eq!(mkdir_line(Path::new("/work/cheri")), "mkdir -p /work/cheri");
        assert_eq!(
            mkdir_line(Path::new("/home/me/my cheri")),
            "mkdir -p '/home/me/my cheri'"
        );
    }

    #[test]
    fn test_command_line_builder() {
        let cmd = CommandLine::new("git")
            .args(["pull", "--rebase"])
            .current_dir("/src/qemu")
            .env("LC_ALL", "C");

        assert_eq!(cmd.program(), "git");
        assert_eq!(cmd.get_args(), ["pull", "--rebase"]);
        assert_eq!(cmd.cwd(), Some(Path::new("/src/qemu")));
        assert_eq!(cmd.envs(), [("LC_ALL".to_string(), "C".to_string())]);
        assert_eq!(cmd.to_string(), "git pull --rebase");
    }

    #[test]
    fn test_command_line_quotes_arguments() {
        let cmd = CommandLine::new("echo").arg("hello world");
        assert_eq!(cmd.to_shell_string(), "echo 'hello world'");
    }

    #[test]
    fn test_session_env_is_added_to_commands() {
        let env = SessionEnv::default();
        env.set("PATH", "/old");
        env.set("PATH", "/c/output/host-tools/bin:/usr/bin");
        env.set("LC_ALL", "C");

        let cmd = env.apply(&CommandLine::new("makefs").env("LC_ALL", "en_US.UTF-8"));

        assert_eq!(
            cmd.envs(),
            [
                ("PATH".to_string(), "/c/output/host-tools/bin:/usr/bin".to_string()),
                ("LC_ALL".to_string(), "en_US.UTF-8".to_string()),
            ]
        );
        assert_eq!(cmd.program(), "makefs");
    }

    #[test]
    fn test_session_env_clones_share_variables() {
        let env = SessionEnv::default();
        let shared = env.clone();

        shared.set("MAKEOBJDIRPREFIX", "/obj");

        assert_eq!(
            env.vars(),
            [("MAKEOBJDIRPREFIX".to_string(), "/obj".to_string())]
        );
    }

    #[tokio::test]
    async fn test_pretend_never_spawns() {
        let cmd = CommandLine::new("/nonexistent/program-that-would-fail");
        assert!(shell(true).run(&cmd).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_is_environment_error() {
        let cmd = CommandLine::new("/nonexistent/program-that-would-fail");
        let err = shell(false).run(&cmd).await.unwrap_err();
        assert!(matches!(
            err,
            CheribuildError::Environment(EnvironmentError::MissingTool { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_external_tool_failure() {
        let cmd = CommandLine::new("sh").args(["-c", "exit 3"]);
        let err = shell(false).run(&cmd).await.unwrap_err();
        match err {
            CheribuildError::ExternalTool(ExternalToolError::Failed { code, log, .. }) => {
                assert_eq!(code, 3);
                assert!(log.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_and_cwd_reach_the_child() {
        let temp = tempfile::TempDir::new().unwrap();
        let cmd = CommandLine::new("sh")
            .args(["-c", "test \"$CHERIBUILD_TEST\" = yes && test -f marker"])
            .current_dir(temp.path())
            .env("CHERIBUILD_TEST", "yes");
        std::fs::write(temp.path().join("marker"), "").unwrap();

        assert!(shell(false).run(&cmd).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exported_variable_reaches_later_commands() {
        let shell = shell(false);
        let cmd = CommandLine::new("sh").args(["-c", "test \"$CHERIBUILD_EXPORTED\" = yes"]);
        assert!(shell.run(&cmd).await.is_err());

        shell.env.set("CHERIBUILD_EXPORTED", "yes");

        assert!(shell.run(&cmd).await.is_ok());
    }
}
