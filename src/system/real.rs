//! Real runner spawning git subprocesses

use super::CommandRunner;
use crate::error::FetchError;
use crate::git::{ExecContext, ExecutionResult, GitCommand, execute};
use async_trait::async_trait;
use std::path::Path;

/// Production implementation of `CommandRunner`
///
/// Delegates every command to the subprocess executor.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new `ProcessRunner` instance
    #[must_use]
    pub const fn new() -> Self {
        return Self;
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        command: &GitCommand,
        cwd: Option<&Path>,
        ctx: &ExecContext,
    ) -> Result<ExecutionResult, FetchError> {
        execute(&command.to_spec(), cwd, ctx).await
    }
}
