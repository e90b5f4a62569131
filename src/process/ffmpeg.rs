//! `ffmpeg` process orchestration.
//!
//! An [`Ffmpeg`] is configured with a builder chain, then executed exactly
//! once. While it runs, four operations are driven concurrently: feeding
//! stdin, draining stdout, splitting stderr into lines (emitting `stderr`
//! and `progress` events), and waiting for exit. The first of them to fail
//! aborts the others, kills the process and becomes the returned error.

use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use super::signal;
use super::state::Lifecycle;
use super::{ExecuteOptions, ExecutionState, Input};
use crate::config::{ErrorMode, FfmpegConfig};
use crate::error::{ErrorClassifier, ErrorKind, FfmpegError};
use crate::events::{EmitError, Event, EventKind, EventNotifier, ListenerError};
use crate::options::{render_command, CommandLine, OptionArg};
use crate::progress::{LineSplitter, Statistics};

/// Size of each read from stdout and stderr.
const READ_CHUNK_SIZE: usize = 8192;

/// Error type for process spawning.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The executable was not found.
    #[error("FFmpeg executable not found: {0}")]
    NotFound(PathBuf),
    /// Permission denied when spawning.
    #[error("Permission denied spawning {0}")]
    PermissionDenied(PathBuf),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error, executable: PathBuf) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(executable),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(executable),
            _ => Self::Io(err),
        }
    }
}

/// Error type for `execute` and `terminate`.
#[derive(thiserror::Error, Debug)]
pub enum ExecuteError {
    /// Classified failure, repeated execution or termination without a run.
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),
    /// The process did not exit in time and was killed.
    #[error("FFmpeg did not exit within {0:?}")]
    Timeout(Duration),
    /// The process could not be started.
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    /// Reading or writing a standard stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A listener returned an error.
    #[error(transparent)]
    Listener(#[from] EmitError),
    /// The graceful termination signal could not be delivered.
    #[error("Failed to signal process: {0}")]
    Signal(#[source] std::io::Error),
    /// A standard stream was not captured.
    #[error("Process {0} not available")]
    MissingPipe(&'static str),
}

impl ExecuteError {
    /// The taxonomy kind, where one applies.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Ffmpeg(e) => Some(e.kind()),
            Self::Timeout(_) => Some(ErrorKind::Timeout),
            _ => None,
        }
    }
}

/// Output of the four concurrent operations after a normal exit.
struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: String,
}

/// A single `ffmpeg` invocation.
#[derive(Debug)]
pub struct Ffmpeg {
    config: FfmpegConfig,
    command: CommandLine,
    classifier: ErrorClassifier,
    events: EventNotifier,
    lifecycle: Mutex<Lifecycle>,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new()
    }
}

impl Ffmpeg {
    /// Create an instance running `ffmpeg` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FfmpegConfig::default())
    }

    /// Create an instance from a configuration.
    #[must_use]
    pub fn with_config(config: FfmpegConfig) -> Self {
        Self {
            config,
            command: CommandLine::new(),
            classifier: ErrorClassifier::default(),
            events: EventNotifier::new(),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Create an instance running a specific executable.
    #[must_use]
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self::with_config(FfmpegConfig::default().with_executable(executable))
    }

    /// Replace the error classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set how classified failures are surfaced.
    #[must_use]
    pub fn error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.config.error_mode = error_mode;
        self
    }

    /// Add a global `-key value` option; a list value repeats the flag.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionArg>) -> Self {
        self.command.option_arg(key, value.into());
        self
    }

    /// Add a global `-key` flag.
    #[must_use]
    pub fn flag(mut self, key: impl Into<String>) -> Self {
        self.command.option_arg(key, OptionArg::Flag);
        self
    }

    /// Add an input file with its options.
    #[must_use]
    pub fn input<I, K, V>(mut self, url: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionArg>,
    {
        self.command.input(url, options);
        self
    }

    /// Add an output file with its options.
    #[must_use]
    pub fn output<I, K, V>(mut self, url: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionArg>,
    {
        self.command.output(url, options);
        self
    }

    /// Register a listener; see [`EventNotifier::on`].
    pub fn on<F>(&self, kind: EventKind, listener: F) -> &Self
    where
        F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.events.on(kind, listener);
        self
    }

    /// Dispatch an event to the registered listeners.
    ///
    /// # Errors
    ///
    /// Returns `EmitError` if a listener fails.
    pub fn emit(&self, event: &Event) -> Result<(), EmitError> {
        self.events.emit(event)
    }

    /// The listener registry shared with this instance.
    #[must_use]
    pub fn events(&self) -> &EventNotifier {
        &self.events
    }

    #[must_use]
    pub fn config(&self) -> &FfmpegConfig {
        &self.config
    }

    #[must_use]
    pub fn command(&self) -> &CommandLine {
        &self.command
    }

    /// The full argument vector, executable first.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        std::iter::once(self.config.executable.to_string_lossy().into_owned())
            .chain(self.command.build())
            .collect()
    }

    /// The argument vector as a shell-escaped string.
    #[must_use]
    pub fn command_line(&self) -> String {
        render_command(&self.arguments())
    }

    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.lifecycle().state()
    }

    /// Whether termination was requested.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.lifecycle().terminated()
    }

    /// Process id while the process is running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.lifecycle().pid()
    }

    /// Run without stdin input and without a timeout.
    ///
    /// # Errors
    ///
    /// See [`Ffmpeg::execute_with`].
    pub async fn execute(&self) -> Result<Vec<u8>, ExecuteError> {
        self.execute_with(ExecuteOptions::default()).await
    }

    /// Run the process and return everything it wrote to stdout.
    ///
    /// On a failing exit status the captured stderr is classified; in
    /// [`ErrorMode::Emit`] the classified error goes to `error` listeners
    /// and the captured stdout is returned instead.
    ///
    /// # Errors
    ///
    /// - `ExecuteError::Ffmpeg` with kind `AlreadyExecuted` if this instance
    ///   has run before, or with the classified kind on a failing exit.
    /// - `ExecuteError::Timeout` if the timeout expired.
    /// - `ExecuteError::Listener` if a listener failed.
    /// - `ExecuteError::Spawn` / `ExecuteError::Io` on process I/O failures.
    pub async fn execute_with(&self, options: ExecuteOptions) -> Result<Vec<u8>, ExecuteError> {
        let arguments = self.arguments();

        {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state() != ExecutionState::Idle {
                return Err(FfmpegError::already_executed(arguments).into());
            }
            lifecycle.transition(ExecutionState::Launching);
        }

        // Settles the instance as Failed on every path that does not reach
        // `settle`, including this future being dropped mid-run.
        let _unsettled = UnsettledGuard { ffmpeg: self };

        let finished = self.run(&arguments, options).await?;

        let state = self.lifecycle().settle(finished.status.success());
        tracing::info!(status = ?finished.status.code(), ?state, "FFmpeg exited");

        match state {
            ExecutionState::Completed => {
                self.events.emit(&Event::Completed)?;
                Ok(finished.stdout)
            }
            ExecutionState::Terminated => {
                self.events.emit(&Event::Terminated)?;
                Ok(finished.stdout)
            }
            _ => {
                let error = self.classifier.classify(&finished.stderr, arguments);
                match self.config.error_mode {
                    ErrorMode::Raise => Err(error.into()),
                    ErrorMode::Emit => {
                        self.events.emit(&Event::Error(error))?;
                        Ok(finished.stdout)
                    }
                }
            }
        }
    }

    /// Ask the running process to stop and finalize its output.
    ///
    /// The process is not killed; `execute` resolves once it exits, with a
    /// `terminated` event unless it still exits successfully.
    ///
    /// # Errors
    ///
    /// Returns `ExecuteError::Ffmpeg` with kind `NotRunning` unless the
    /// process is running, or `ExecuteError::Signal` if the signal fails.
    pub fn terminate(&self) -> Result<(), ExecuteError> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state() != ExecutionState::Running {
            return Err(FfmpegError::not_running(self.arguments()).into());
        }

        lifecycle.mark_terminated();
        let Some(pid) = lifecycle.pid() else {
            tracing::debug!("Process already exited, nothing to signal");
            return Ok(());
        };

        signal::send_graceful(pid).map_err(ExecuteError::Signal)?;
        tracing::info!(pid, "Sent graceful termination signal");
        Ok(())
    }

    async fn run(
        &self,
        arguments: &[String],
        options: ExecuteOptions,
    ) -> Result<Finished, ExecuteError> {
        self.events.emit(&Event::Start(arguments.to_vec()))?;

        let ExecuteOptions { input, timeout } = options;

        let mut cmd = Command::new(&self.config.executable);
        cmd.args(arguments.iter().skip(1))
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        signal::prepare(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| SpawnError::from_io(e, self.config.executable.clone()))?;

        {
            let mut lifecycle = self.lifecycle();
            lifecycle.set_pid(child.id());
            lifecycle.transition(ExecutionState::Running);
        }
        tracing::info!(pid = ?child.id(), command = %render_command(arguments), "Spawned FFmpeg");

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or(ExecuteError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(ExecuteError::MissingPipe("stderr"))?;

        let result = tokio::try_join!(
            write_stdin(stdin, input, self.config.stdin_chunk_size),
            read_stdout(stdout),
            self.read_stderr(stderr),
            self.wait_for_exit(&mut child, timeout),
        );

        match result {
            Ok(((), stdout, stderr, status)) => Ok(Finished {
                status,
                stdout,
                stderr,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "FFmpeg run failed, killing process");
                // Cleared before the kill reaps the child, so `terminate`
                // can no longer pick the pid up.
                self.lifecycle().set_pid(None);
                if let Err(kill_err) = child.kill().await {
                    tracing::warn!(error = %kill_err, "Failed to kill FFmpeg");
                }
                Err(e)
            }
        }
    }

    async fn read_stderr(&self, mut stderr: ChildStderr) -> Result<String, ExecuteError> {
        let mut splitter = LineSplitter::new();
        let mut text = String::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let n = stderr.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            for line in splitter.push(&chunk[..n]) {
                self.handle_stderr_line(&line, &mut text)?;
            }
        }

        if let Some(line) = splitter.finish() {
            self.handle_stderr_line(&line, &mut text)?;
        }

        Ok(text)
    }

    fn handle_stderr_line(&self, raw: &[u8], text: &mut String) -> Result<(), ExecuteError> {
        let line = String::from_utf8_lossy(raw).into_owned();
        tracing::trace!(%line, "FFmpeg stderr");

        text.push_str(&line);
        text.push('\n');

        let statistics = Statistics::from_line(&line);
        self.events.emit(&Event::Stderr(line))?;
        if let Some(statistics) = statistics {
            self.events.emit(&Event::Progress(statistics))?;
        }
        Ok(())
    }

    async fn wait_for_exit(
        &self,
        child: &mut Child,
        timeout: Option<Duration>,
    ) -> Result<ExitStatus, ExecuteError> {
        let mut wait = std::pin::pin!(child.wait());

        // The child is reaped inside `poll`, so the lifecycle lock is held
        // across it: `terminate` either signals a live child or sees no pid.
        let reaped = std::future::poll_fn(|cx| {
            let mut lifecycle = self.lifecycle();
            let poll = wait.as_mut().poll(cx);
            if poll.is_ready() {
                lifecycle.set_pid(None);
            }
            poll
        });

        let status = match timeout {
            Some(limit) => tokio::time::timeout(limit, reaped)
                .await
                .map_err(|_| ExecuteError::Timeout(limit))??,
            None => reaped.await?,
        };
        Ok(status)
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a run that ends without reaching a terminal state as Failed.
struct UnsettledGuard<'a> {
    ffmpeg: &'a Ffmpeg,
}

impl Drop for UnsettledGuard<'_> {
    fn drop(&mut self) {
        let mut lifecycle = self.ffmpeg.lifecycle();
        if !lifecycle.state().is_terminal() {
            lifecycle.set_pid(None);
            lifecycle.transition(ExecutionState::Failed);
        }
    }
}

async fn write_stdin(
    stdin: Option<ChildStdin>,
    input: Option<Input>,
    chunk_size: usize,
) -> Result<(), ExecuteError> {
    let (Some(mut stdin), Some(input)) = (stdin, input) else {
        return Ok(());
    };

    let mut reader = input.into_reader();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut written: u64 = 0;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        if let Err(e) = stdin.write_all(&buffer[..n]).await {
            return closed_early(e, written);
        }
        written += n as u64;
    }

    if let Err(e) = stdin.shutdown().await {
        return closed_early(e, written);
    }
    tracing::debug!(bytes = written, "Finished writing stdin");
    Ok(())
}

/// A broken pipe means the process stopped reading; its exit status decides
/// the outcome.
fn closed_early(err: std::io::Error, written: u64) -> Result<(), ExecuteError> {
    if err.kind() == std::io::ErrorKind::BrokenPipe {
        tracing::debug!(bytes = written, "FFmpeg closed stdin early");
        Ok(())
    } else {
        Err(err.into())
    }
}

async fn read_stdout(mut stdout: ChildStdout) -> Result<Vec<u8>, ExecuteError> {
    let mut buffer = Vec::new();
    stdout.read_to_end(&mut buffer).await?;
    Ok(buffer)
}
