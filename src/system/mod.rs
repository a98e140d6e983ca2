//! System abstraction for running git
//!
//! This module provides the seam between the fetch pipeline and the external
//! git executable, allowing the orchestration to be tested against a
//! recording stand-in instead of real subprocesses.

use crate::error::FetchError;
use crate::git::{ExecContext, ExecutionResult, GitCommand};
use async_trait::async_trait;
use std::path::Path;

pub mod mock;
pub mod real;

pub use mock::MockRunner;
pub use real::ProcessRunner;

/// Runs one git command to completion
///
/// # Implementations
/// - `ProcessRunner`: Production implementation spawning real subprocesses
/// - `MockRunner`: Test implementation that records invocations and
///   simulates their effect on the working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `cwd` as the subprocess's working directory
    async fn run(
        &self,
        command: &GitCommand,
        cwd: Option<&Path>,
        ctx: &ExecContext,
    ) -> Result<ExecutionResult, FetchError>;
}
