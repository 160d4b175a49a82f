//! Child-process execution for the resolved formatter.
//!
//! Two invocation shapes are supported. Filter mode streams the document to
//! the formatter's stdin (signalled by a trailing `-` argument) and reads the
//! formatted result back from stdout. Mutate mode hands target paths to the
//! formatter and trusts it to rewrite them on disk; output is captured only
//! for logging.
//!
//! Streams are drained on dedicated reader threads and buffered in full; an
//! invocation resolves only after the process has exited *and* both readers
//! have been joined, never on stream-end alone.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Fully resolved, side-effect-free description of what to run.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Executable path or command name.
    pub command: String,
    /// Arguments preceding the mode-specific ones (`-` or target paths).
    pub args: Vec<String>,
    /// Working directory for the child; `None` inherits ours.
    pub working_dir: Option<PathBuf>,
}

/// Cooperative cancellation for an in-flight invocation.
///
/// Cloning shares the flag. Once triggered, the runner kills the child and
/// surfaces [`FormatterError::Cancelled`] instead of discarding output
/// silently.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Classified failure from resolving or running the formatter.
///
/// The classes are distinct because the user-facing remedy differs: install
/// the tool, fix the input, or investigate the environment.
#[derive(Debug, Error)]
pub enum FormatterError {
    /// The resolved executable is absent, not executable, or failed the
    /// version probe. Detected before any formatting process is spawned.
    #[error(
        "\"{command}\" is not found. Please install sqlfmt (https://github.com/tconbeer/sqlfmt) first, or point the `path` option at the executable"
    )]
    NotInstalled { command: String },

    /// The formatter ran and exited nonzero; `stderr` is its own diagnostic.
    #[error("sqlfmt exited with code {code}: {stderr}")]
    ExecutionFailed { code: i32, stderr: String },

    /// The operating system could not start the child process.
    #[error("failed to start \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The formatter exceeded the configured time budget and was killed.
    #[error("sqlfmt timed out after {}ms", timeout.as_millis())]
    Timeout { timeout: Duration },

    /// The invocation was cancelled and the child terminated.
    #[error("formatting was cancelled")]
    Cancelled,

    /// I/O failure while feeding or draining the child.
    #[error("I/O error while running sqlfmt: {0}")]
    Io(#[from] std::io::Error),
}

/// Buffered output of a finished child process.
struct RawOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl RawOutput {
    fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Executor for formatter invocations.
///
/// Carries only the configured timeout; every invocation is independent, so
/// concurrent requests cannot observe each other's state.
#[derive(Debug, Clone)]
pub struct FormatterExecutor {
    timeout: Option<Duration>,
}

impl FormatterExecutor {
    /// Create an executor. A `timeout_ms` of zero disables the deadline.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }

    /// Filter mode: feed `input` to the formatter's stdin and return its
    /// stdout on a clean exit.
    ///
    /// Exit code 0 with non-empty stderr is still success; the stderr text is
    /// logged as informational. A nonzero exit is a failure regardless of
    /// what was written to stdout.
    pub fn run_as_filter(
        &self,
        invocation: &Invocation,
        input: &str,
        cancel: Option<&CancellationFlag>,
    ) -> Result<String, FormatterError> {
        let mut args = invocation.args.clone();
        args.push("-".to_string());

        let output = self.run(invocation, &args, Some(input), cancel)?;
        if output.status.success() {
            if !output.stderr.is_empty() {
                log::info!("sqlfmt: {}", output.stderr.trim_end());
            }
            Ok(output.stdout)
        } else {
            Err(FormatterError::ExecutionFailed {
                code: output.exit_code(),
                stderr: output.stderr,
            })
        }
    }

    /// Mutate mode: append `targets` to the arguments and let the formatter
    /// rewrite them on disk. Output is captured only for the log; a nonzero
    /// exit code is the sole failure signal.
    pub fn run_in_place(
        &self,
        invocation: &Invocation,
        targets: &[PathBuf],
        cancel: Option<&CancellationFlag>,
    ) -> Result<(), FormatterError> {
        let mut args = invocation.args.clone();
        args.extend(targets.iter().map(|path| path.display().to_string()));

        let output = self.run(invocation, &args, None, cancel)?;
        if !output.stdout.is_empty() {
            log::info!("sqlfmt: {}", output.stdout.trim_end());
        }
        if !output.stderr.is_empty() {
            log::info!("sqlfmt: {}", output.stderr.trim_end());
        }
        if output.status.success() {
            Ok(())
        } else {
            Err(FormatterError::ExecutionFailed {
                code: output.exit_code(),
                stderr: output.stderr,
            })
        }
    }

    fn run(
        &self,
        invocation: &Invocation,
        args: &[String],
        input: Option<&str>,
        cancel: Option<&CancellationFlag>,
    ) -> Result<RawOutput, FormatterError> {
        let mut cmd = Command::new(&invocation.command);
        cmd.args(args);
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        log::info!("execute: {}", render_command_line(&invocation.command, args));

        let mut child = cmd.spawn().map_err(|source| FormatterError::Spawn {
            command: invocation.command.clone(),
            source,
        })?;

        let stdout_handle = child
            .stdout
            .take()
            .map(|stdout| thread::spawn(move || read_pipe_to_string(stdout)));
        let stderr_handle = child
            .stderr
            .take()
            .map(|stderr| thread::spawn(move || read_pipe_to_string(stderr)));

        // The readers above are already draining the output pipes, so a large
        // write here cannot deadlock. Dropping the handle closes the pipe and
        // gives the formatter its EOF.
        if let Some(input) = input
            && let Some(mut stdin) = child.stdin.take()
            && let Err(err) = stdin.write_all(input.as_bytes())
        {
            // A broken pipe means the child exited early; let its exit code
            // and stderr tell the story instead.
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                let _ = child.kill();
                let _ = child.wait();
                let _ = join_reader(stdout_handle);
                let _ = join_reader(stderr_handle);
                return Err(err.into());
            }
        }

        let status = match self.await_exit(&mut child, cancel) {
            Ok(status) => status,
            Err(failure) => {
                let _ = join_reader(stdout_handle);
                let _ = join_reader(stderr_handle);
                return Err(failure);
            }
        };

        let stdout = join_reader(stdout_handle)?;
        let stderr = join_reader(stderr_handle)?;
        log::debug!("sqlfmt exited with code {}", status.code().unwrap_or(-1));

        Ok(RawOutput { status, stdout, stderr })
    }

    /// Wait for the child's terminal lifecycle event.
    ///
    /// Without a deadline or cancellation flag this is a plain blocking
    /// `wait()`. With either armed, the child is polled so the kill paths can
    /// fire; the kill is always followed by a reap so no zombie is left.
    fn await_exit(
        &self,
        child: &mut Child,
        cancel: Option<&CancellationFlag>,
    ) -> Result<ExitStatus, FormatterError> {
        if self.timeout.is_none() && cancel.is_none() {
            return Ok(child.wait()?);
        }

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if let Some(flag) = cancel
                && flag.is_cancelled()
            {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FormatterError::Cancelled);
            }
            if let Some(timeout) = self.timeout
                && start.elapsed() >= timeout
            {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FormatterError::Timeout { timeout });
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Default for FormatterExecutor {
    fn default() -> Self {
        Self::new(30_000)
    }
}

/// Run `child` to completion with a hard deadline, reaping it on timeout.
/// Used by the locator's liveness probe.
pub(crate) fn wait_with_deadline(mut child: Child, deadline: Duration) -> std::io::Result<ExitStatus> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "liveness probe timed out",
            ));
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn read_pipe_to_string<R: Read>(mut pipe: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn join_reader(
    handle: Option<thread::JoinHandle<std::io::Result<String>>>,
) -> Result<String, FormatterError> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(read) => Ok(read?),
            Err(_) => Err(FormatterError::Io(std::io::Error::other(
                "output reader thread panicked",
            ))),
        },
        None => Ok(String::new()),
    }
}

fn render_command_line(command: &str, args: &[String]) -> String {
    let mut line = String::from(command);
    for arg in args {
        line.push(' ');
        if arg.contains(' ') {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}
