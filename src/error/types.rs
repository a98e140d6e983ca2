//! Custom error types with exit codes

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gitrip operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// Configuration Error - missing or invalid settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The remote URL does not yield an `{owner, project}` pair
    #[error("Cannot derive owner/project from remote URL '{url}': {reason}")]
    RemoteUrlUnparseable { url: String, reason: String },

    /// A pre-execution action failed before the subprocess was spawned
    #[error("Failed to prepare `{command_line}`: could not create {}: {source}", .path.display())]
    PreExecutionActionFailed {
        command_line: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The subprocess could not be started at all
    #[error("Failed to run `{command_line}`: {message}")]
    SubprocessSpawn {
        command_line: String,
        message: String,
    },

    /// The subprocess exited unsuccessfully
    #[error("`{command_line}` exited with {}{}", describe_status(.status), describe_stderr(.stderr))]
    SubprocessFailed {
        command_line: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The run was cancelled while `command_line` was pending or running
    #[error("Cancelled: `{command_line}`")]
    Cancelled { command_line: String },

    /// The subprocess ran longer than the configured timeout
    #[error("Timed out after {seconds}s: `{command_line}`")]
    TimedOut { command_line: String, seconds: u64 },

    /// The destination could not be turned into an absolute path
    #[error("Cannot resolve destination '{}': {source}", .path.display())]
    DestinationResolutionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The working directory could not be created
    #[error("Working directory error: {message}")]
    WorkingDirectory { message: String },

    /// An entry of the working tree could not be read or mirrored
    #[error("Failed to traverse {}: {message}", .path.display())]
    TraversalFailed { path: PathBuf, message: String },

    /// A single file could not be copied into the destination
    #[error("Failed to copy {} to {}: {message}", .source_path.display(), .dest_path.display())]
    FileCopyFailed {
        source_path: PathBuf,
        dest_path: PathBuf,
        message: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match *status {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_owned(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl FetchError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } | Self::RemoteUrlUnparseable { .. } => 1,
            Self::SubprocessSpawn { .. } | Self::SubprocessFailed { .. } => 4,
            Self::PreExecutionActionFailed { .. }
            | Self::DestinationResolutionFailed { .. }
            | Self::WorkingDirectory { .. }
            | Self::TraversalFailed { .. }
            | Self::FileCopyFailed { .. } => 5,
            Self::TimedOut { .. } => 124,
            Self::Cancelled { .. } => 130,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unparseable remote error
    #[inline]
    pub fn remote_url<U: Into<String>, R: Into<String>>(url: U, reason: R) -> Self {
        Self::RemoteUrlUnparseable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a working directory error
    #[inline]
    pub fn working_directory<S: Into<String>>(message: S) -> Self {
        Self::WorkingDirectory {
            message: message.into(),
        }
    }

    /// The rendered command line, for errors raised by the executor
    #[must_use]
    pub fn command_line(&self) -> Option<&str> {
        match self {
            Self::PreExecutionActionFailed { command_line, .. }
            | Self::SubprocessSpawn { command_line, .. }
            | Self::SubprocessFailed { command_line, .. }
            | Self::Cancelled { command_line }
            | Self::TimedOut { command_line, .. } => Some(command_line),
            _ => None,
        }
    }
}
