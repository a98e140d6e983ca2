//! Fetch operation coordination

use crate::error::FetchError;
use crate::git::{ExecContext, SparseCheckout};
use crate::operations::materialize::{MaterializeReport, materialize};
use crate::operations::workdir::{CacheMode, WorkingDirectory};
use crate::system::CommandRunner;
use crate::utils::{Progress, resolve_destination};
use anyhow::Result;
use core::cell::Cell;
use core::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What to fetch and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub remote: String,
    pub paths: Vec<String>,
    pub revision: String,
    pub destination: PathBuf,
    pub mode: CacheMode,
}

/// Progress of one fetch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Init,
    Located,
    Cloned,
    SparseConfigured,
    CheckedOut,
    Materialized,
    Failed,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::Init => "init",
            Self::Located => "located",
            Self::Cloned => "cloned",
            Self::SparseConfigured => "sparse-configured",
            Self::CheckedOut => "checked-out",
            Self::Materialized => "materialized",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a completed fetch
#[derive(Debug)]
pub struct FetchReport {
    pub state: FetchState,
    pub working_dir: PathBuf,
    pub destination: PathBuf,
    /// A persistent mirror was reused instead of cloning
    pub clone_skipped: bool,
    pub files_copied: usize,
    pub bytes_copied: u64,
    /// Files that could not be copied; the run still succeeded
    pub failures: Vec<FetchError>,
}

/// Coordinates the complete fetch operation
#[non_exhaustive]
pub struct FetchOperation<'run> {
    request: FetchRequest,
    runner: &'run dyn CommandRunner,
    ctx: ExecContext,
    progress: Progress,
    state: Cell<FetchState>,
}

impl<'run> FetchOperation<'run> {
    /// Create a new fetch operation
    #[must_use]
    pub fn new(request: FetchRequest, runner: &'run dyn CommandRunner, ctx: ExecContext) -> Self {
        Self {
            request,
            runner,
            ctx,
            progress: Progress::hidden(),
            state: Cell::new(FetchState::Init),
        }
    }

    /// Report stage progress on the terminal
    #[must_use]
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Current state of the run
    #[must_use]
    pub fn state(&self) -> FetchState {
        self.state.get()
    }

    /// Execute the fetch operation
    ///
    /// Runs clone (unless a persistent mirror exists), sparse-checkout and
    /// checkout in order, then copies the working tree into the destination.
    /// An ephemeral working directory is removed afterwards whatever the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The destination cannot be resolved
    /// - The working directory cannot be located or created
    /// - Any git stage fails, is cancelled or times out
    /// - The working tree cannot be traversed
    pub async fn execute(self) -> Result<FetchReport> {
        info!(
            "Fetching [{}] from {} at {}",
            self.request.paths.join(", "),
            self.request.remote,
            self.request.revision
        );

        let destination = match resolve_destination(&self.request.destination) {
            Ok(destination) => destination,
            Err(err) => return Err(self.fail(err.into())),
        };
        debug!("Destination: {}", destination.display());

        let workdir = match WorkingDirectory::locate(&self.request.mode, &self.request.remote) {
            Ok(workdir) => workdir,
            Err(err) => return Err(self.fail(err.into())),
        };
        self.advance(FetchState::Located);

        let outcome = self.fetch_into(&workdir, &destination).await;
        self.progress.finish();
        let working_dir = workdir.path().to_path_buf();
        workdir.release();

        match outcome {
            Ok((clone_skipped, copied)) => Ok(FetchReport {
                state: self.state(),
                working_dir,
                destination,
                clone_skipped,
                files_copied: copied.files_copied,
                bytes_copied: copied.bytes_copied,
                failures: copied.failures,
            }),
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn fetch_into(
        &self,
        workdir: &WorkingDirectory,
        destination: &Path,
    ) -> Result<(bool, MaterializeReport)> {
        let repo_path = workdir.path();
        let steps = SparseCheckout::new(
            self.runner,
            &self.ctx,
            &self.request.remote,
            &self.request.paths,
            &self.request.revision,
        );

        let clone_skipped = !workdir.is_ephemeral() && workdir.has_mirror();
        if clone_skipped {
            info!("Reusing cached clone at {}", repo_path.display());
        } else {
            self.ensure_not_cancelled("clone")?;
            self.progress.stage(format!("Cloning {}", self.request.remote));
            steps.clone_repository(repo_path).await?;
        }
        self.advance(FetchState::Cloned);

        self.ensure_not_cancelled("sparse-checkout")?;
        self.progress.stage("Selecting paths");
        steps.set_sparse_patterns(repo_path).await?;
        self.advance(FetchState::SparseConfigured);

        self.ensure_not_cancelled("checkout")?;
        self.progress
            .stage(format!("Checking out {}", self.request.revision));
        steps.checkout_reference(repo_path).await?;
        self.advance(FetchState::CheckedOut);

        if let Ok(diagnostics) = steps.checkout_diagnostics(repo_path) {
            debug!("{diagnostics}");
        }

        self.progress.start_copy();
        let copied = materialize(repo_path, destination, &self.progress).await?;
        self.advance(FetchState::Materialized);

        Ok((clone_skipped, copied))
    }

    fn ensure_not_cancelled(&self, stage: &str) -> Result<(), FetchError> {
        if self.ctx.is_cancelled() {
            return Err(FetchError::Cancelled {
                command_line: format!("git {stage}"),
            });
        }
        Ok(())
    }

    fn advance(&self, next: FetchState) {
        debug!("Fetch state: {} -> {next}", self.state());
        self.state.set(next);
    }

    fn fail(&self, err: anyhow::Error) -> anyhow::Error {
        warn!("Fetch failed after reaching state '{}'", self.state());
        self.advance(FetchState::Failed);
        err
    }
}
