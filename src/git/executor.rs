//! Subprocess execution for built git commands

use crate::error::FetchError;
use crate::git::command::{CommandSpec, PreExecAction};
use core::time::Duration;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWriteExt as _};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Where the subprocess's diagnostic stream goes while it runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiagnosticSink {
    /// Drop diagnostics (they are still kept for error messages)
    #[default]
    Quiet,
    /// Copy diagnostics verbatim to this process's stderr
    Passthrough,
}

/// Cancellation, timeout and output routing for command execution
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
    sink: DiagnosticSink,
}

impl ExecContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any invocation that runs longer than `timeout`
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_sink(mut self, sink: DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    /// Share an existing cancellation token
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels every invocation made with this context
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub const fn sink(&self) -> DiagnosticSink {
        self.sink
    }
}

/// Output of a successful invocation
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub command_line: String,
}

/// How long the pipes of an exited subprocess may stay open
const PIPE_GRACE: Duration = Duration::from_millis(500);

enum Completion {
    Exited(io::Result<ExitStatus>),
    Cancelled,
    TimedOut(Duration),
}

/// Run `spec` to completion
///
/// Pre-execution actions run first; the subprocess inherits `cwd` as its
/// working directory when given, leaving this process's own current
/// directory untouched.
///
/// # Errors
///
/// Returns an error if:
/// - The context was cancelled before anything ran (`Cancelled`)
/// - A pre-execution action fails (`PreExecutionActionFailed`)
/// - The program cannot be spawned (`SubprocessSpawn`)
/// - The context is cancelled or times out while the program runs
/// - The program exits unsuccessfully (`SubprocessFailed`)
pub async fn execute(
    spec: &CommandSpec,
    cwd: Option<&Path>,
    ctx: &ExecContext,
) -> Result<ExecutionResult, FetchError> {
    let command_line = spec.command_line();

    if ctx.is_cancelled() {
        return Err(FetchError::Cancelled { command_line });
    }

    for action in spec.pre_exec() {
        match action {
            PreExecAction::CreateDirAll(path) => {
                let path = cwd.map_or_else(|| path.clone(), |cwd| cwd.join(path));
                debug!("mkdir -p {}", path.display());
                if let Err(source) = tokio::fs::create_dir_all(&path).await {
                    return Err(FetchError::PreExecutionActionFailed {
                        command_line,
                        path,
                        source,
                    });
                }
            }
        }
    }

    let mut command = Command::new(spec.program());
    command
        .args(spec.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    match cwd {
        Some(cwd) => debug!("exec (in {}): {command_line}", cwd.display()),
        None => debug!("exec: {command_line}"),
    }

    let mut child = command.spawn().map_err(|err| FetchError::SubprocessSpawn {
        command_line: command_line.clone(),
        message: if err.kind() == io::ErrorKind::NotFound {
            format!(
                "{err}. Please ensure {} is installed and available in PATH",
                spec.program()
            )
        } else {
            err.to_string()
        },
    })?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(FetchError::SubprocessSpawn {
            command_line,
            message: "subprocess pipes were not captured".to_owned(),
        });
    };
    let output = tokio::spawn(read_output(stdout));
    let diagnostics = tokio::spawn(drain_diagnostics(stderr, ctx.sink()));

    // Completion is the child's exit, not the end of its pipes: descendants
    // such as an ssh control master may hold them open long after.
    let completion = tokio::select! {
        status = child.wait() => Completion::Exited(status),
        () = ctx.cancel.cancelled() => Completion::Cancelled,
        () = deadline(ctx.timeout) => Completion::TimedOut(ctx.timeout.unwrap_or_default()),
    };

    let stopped = match completion {
        Completion::Exited(Ok(status)) => Ok(status),
        Completion::Exited(Err(err)) => Err(FetchError::SubprocessSpawn {
            command_line: command_line.clone(),
            message: format!("lost track of the subprocess: {err}"),
        }),
        Completion::Cancelled => Err(FetchError::Cancelled {
            command_line: command_line.clone(),
        }),
        Completion::TimedOut(limit) => Err(FetchError::TimedOut {
            command_line: command_line.clone(),
            seconds: limit.as_secs(),
        }),
    };
    let status = match stopped {
        Ok(status) => status,
        Err(err) => {
            output.abort();
            diagnostics.abort();
            if let Err(kill_err) = child.kill().await {
                debug!("failed to kill `{command_line}`: {kill_err}");
            }
            return Err(err);
        }
    };

    let stdout = collect(output, "output", &command_line).await;
    let stderr = collect(diagnostics, "diagnostics", &command_line).await;

    if status.success() {
        debug!("`{command_line}` finished successfully");
        Ok(ExecutionResult {
            stdout,
            stderr,
            command_line,
        })
    } else {
        Err(FetchError::SubprocessFailed {
            command_line,
            status: status.code(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Wait up to [`PIPE_GRACE`] for a pipe reader of an exited subprocess
///
/// Whatever is still held open after that is abandoned.
async fn collect(
    reader: JoinHandle<io::Result<Vec<u8>>>,
    stream: &str,
    command_line: &str,
) -> Vec<u8> {
    let abort = reader.abort_handle();
    match tokio::time::timeout(PIPE_GRACE, reader).await {
        Ok(Ok(Ok(captured))) => captured,
        Ok(Ok(Err(err))) => {
            debug!("failed to read {stream} of `{command_line}`: {err}");
            Vec::new()
        }
        Ok(Err(err)) => {
            debug!("{stream} reader for `{command_line}` did not finish: {err}");
            Vec::new()
        }
        Err(_) => {
            abort.abort();
            debug!("{stream} of `{command_line}` still held open after exit, abandoning it");
            Vec::new()
        }
    }
}

async fn read_output<R>(mut stream: R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    stream.read_to_end(&mut captured).await?;
    Ok(captured)
}

/// Resolve after `limit`, or never when there is no limit
async fn deadline(limit: Option<Duration>) {
    match limit {
        Some(limit) => tokio::time::sleep(limit).await,
        None => core::future::pending().await,
    }
}

/// Read the diagnostic stream to its end, forwarding it to `sink`
async fn drain_diagnostics<R>(mut stream: R, sink: DiagnosticSink) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut passthrough = tokio::io::stderr();
    let mut buffer = [0_u8; 8192];

    loop {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        let chunk = &buffer[..read];
        captured.extend_from_slice(chunk);
        if sink == DiagnosticSink::Passthrough {
            passthrough.write_all(chunk).await?;
        }
    }

    if sink == DiagnosticSink::Passthrough {
        passthrough.flush().await?;
    }
    Ok(captured)
}
