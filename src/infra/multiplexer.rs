//! Output multiplexer for long-running builds
//!
//! Runs one external command and fans its output out to a log file and the
//! terminal. The calling task reads stdout and renders milestones and a
//! single self-overwriting progress line; a spawned task copies stderr to the
//! terminal verbatim. Both append to the same log through one lock that is
//! held for exactly one line, so lines are never merged and each stream
//! keeps its own order. A broken terminal only stops the rendering; the log
//! still receives every line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::config::Config;
use crate::core::classify::{classify_line, LineKind};
use crate::error::{EnvironmentError, ExternalToolError, FilesystemError, Result};
use crate::infra::process::{check_status, echo_command, spawn_error, CommandLine, SessionEnv};

/// Log file and terminal state shared by the two stream readers of one
/// invocation
pub struct LogSession {
    path: PathBuf,
    state: Mutex<SessionState>,
}

struct SessionState {
    log: BufWriter<File>,
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    last_drawn: Option<LineKind>,
    /// First failed terminal write; nothing is rendered after it
    terminal_error: Option<io::Error>,
}

impl LogSession {
    /// Log file for `target` of `project`, e.g. `cheribsd.buildworld.log`
    pub fn log_path(dir: &Path, project: &str, target: &str) -> PathBuf {
        dir.join(format!("{project}.{target}.log"))
    }

    /// Create (truncate) the log at `path`, rendering to the real terminal
    pub fn create(path: &Path) -> Result<Self> {
        Self::with_terminal(path, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Create (truncate) the log at `path`, rendering to the given writers
    pub fn with_terminal(
        path: &Path,
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
    ) -> Result<Self> {
        let file = create_log_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(SessionState {
                log: BufWriter::new(file),
                stdout,
                stderr,
                last_drawn: None,
                terminal_error: None,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log a stdout line and render it according to its [`LineKind`]
    ///
    /// Only log failures are returned.
    pub fn record_stdout(&self, line: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        state.append_to_log(line)?;
        if state.terminal_error.is_none() {
            let rendered = state.render_stdout(line);
            state.note_terminal(rendered);
        }
        Ok(())
    }

    /// Log a stderr line and copy it to the terminal unmodified
    ///
    /// Only log failures are returned.
    pub fn record_stderr(&self, line: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        state.append_to_log(line)?;
        if state.terminal_error.is_none() {
            let copied = state
                .stderr
                .write_all(line)
                .and_then(|()| state.stderr.flush());
            state.note_terminal(copied);
        }
        Ok(())
    }

    /// Flush the log and end a dangling progress line
    pub fn finish(&self) -> io::Result<()> {
        let mut state = self.lock();
        if state.terminal_error.is_none() {
            let ended = state.end_progress_line();
            state.note_terminal(ended);
        }
        state.log.flush()
    }

    /// The terminal write failure that stopped rendering, if any
    pub fn take_terminal_error(&self) -> Option<io::Error> {
        self.lock().terminal_error.take()
    }
}

impl SessionState {
    fn render_stdout(&mut self, line: &[u8]) -> io::Result<()> {
        let kind = classify_line(line);
        match kind {
            LineKind::MajorStatus => {
                if self.last_drawn == Some(LineKind::SubdirProgress) {
                    clear_current_line(&mut self.stdout)?;
                }
                self.stdout.write_all(trim_newline(line))?;
                self.stdout.write_all(b"\n")?;
            }
            LineKind::SubdirProgress => {
                clear_current_line(&mut self.stdout)?;
                self.stdout.write_all(trim_newline(line))?;
                // gap before anything stderr prints after the progress line
                self.stdout.write_all(b" ")?;
            }
            LineKind::Plain => return Ok(()),
        }
        self.stdout.flush()?;
        self.last_drawn = Some(kind);
        Ok(())
    }

    fn end_progress_line(&mut self) -> io::Result<()> {
        if self.last_drawn == Some(LineKind::SubdirProgress) {
            self.stdout.write_all(b"\n")?;
            self.last_drawn = None;
        }
        self.stdout.flush()
    }

    fn note_terminal(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if self.terminal_error.is_none() {
                self.terminal_error = Some(e);
            }
        }
    }

    fn append_to_log(&mut self, line: &[u8]) -> io::Result<()> {
        self.log.write_all(line)?;
        if !line.ends_with(b"\n") {
            self.log.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn clear_current_line(out: &mut Box<dyn Write + Send>) -> io::Result<()> {
    queue!(out, Clear(ClearType::CurrentLine), MoveToColumn(0))
}

fn create_log_file(path: &Path) -> Result<File, FilesystemError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FilesystemError::CreateDir {
            path: parent.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    File::create(path).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read `stream` line by line until EOF, handing each line to `sink`
///
/// Keeps draining after a sink error so the child never blocks on a full
/// pipe; the first sink error is returned at EOF.
async fn pump<R, F>(stream: R, mut sink: F) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&[u8]) -> io::Result<()>,
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let mut first_error = None;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if first_error.is_none() {
            if let Err(e) = sink(&line) {
                first_error = Some(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Runs long build commands with logging and condensed terminal output
#[derive(Debug, Clone)]
pub struct OutputMultiplexer {
    pretend: bool,
    quiet: bool,
    env: SessionEnv,
}

impl OutputMultiplexer {
    pub fn new(config: &Config, env: SessionEnv) -> Self {
        Self {
            pretend: config.pretend(),
            quiet: config.quiet(),
            env,
        }
    }

    /// Run `command`, logging to `<log_dir>/<project>.<target>.log`
    ///
    /// Only echoes in pretend mode. In quiet mode both streams go straight to
    /// the log. A non-zero exit yields [`ExternalToolError::Failed`] carrying
    /// the log path.
    pub async fn run(
        &self,
        command: &CommandLine,
        log_dir: &Path,
        project: &str,
        target: &str,
    ) -> Result<()> {
        let command = &self.env.apply(command);
        echo_command(&command.to_shell_string(), command.cwd());
        if self.pretend {
            return Ok(());
        }

        let log_path = LogSession::log_path(log_dir, project, target);
        println!("Saving build log to {}", log_path.display());

        if self.quiet {
            return run_to_log(command, &log_path).await;
        }
        let session = Arc::new(LogSession::create(&log_path)?);
        run_session(command, session).await
    }
}

/// Run `command` with both streams redirected into the log file
async fn run_to_log(command: &CommandLine, log_path: &Path) -> Result<()> {
    let log = create_log_file(log_path)?;
    let err_log = log.try_clone().map_err(|e| FilesystemError::WriteFile {
        path: log_path.to_path_buf(),
        error: e.to_string(),
    })?;

    let status = command
        .to_tokio()
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(err_log))
        .status()
        .await
        .map_err(|e| spawn_error(command, &e))?;
    check_status(command, status, Some(log_path))?;
    Ok(())
}

/// Run `command`, feeding stdout and stderr through `session`
///
/// The stderr reader runs as its own task and is joined before returning.
/// The exit status is checked before any log or terminal failure, so a
/// failed command is always reported with its log.
pub async fn run_session(command: &CommandLine, session: Arc<LogSession>) -> Result<()> {
    let mut child = command
        .to_tokio()
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(command, &e))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(ExternalToolError::Spawn {
            command: command.to_shell_string(),
            error: "output streams were not captured".to_string(),
        }
        .into());
    };

    let err_session = Arc::clone(&session);
    let stderr_reader =
        tokio::spawn(async move { pump(stderr, |line| err_session.record_stderr(line)).await });

    let stdout_result = pump(stdout, |line| session.record_stdout(line)).await;
    let status = child.wait().await;
    let stderr_result = stderr_reader.await;
    let finish_result = session.finish();

    let status = status.map_err(|e| spawn_error(command, &e))?;
    check_status(command, status, Some(session.path()))?;

    let log_error = |error: String| EnvironmentError::Io {
        path: session.path().to_path_buf(),
        error,
    };
    stdout_result.map_err(|e| log_error(e.to_string()))?;
    stderr_result
        .map_err(|e| log_error(format!("stderr reader failed: {e}")))?
        .map_err(|e| log_error(e.to_string()))?;
    finish_result.map_err(|e| log_error(e.to_string()))?;

    if let Some(e) = session.take_terminal_error() {
        tracing::warn!("stopped rendering build output: {e}");
    }
    Ok(())
}
