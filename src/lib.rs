//! `gitrip` - Download a subset of files or directories from a git repository
//!
//! The pipeline performs a shallow clone without checkout, narrows the
//! checkout to the requested paths with git's sparse-checkout, checks out
//! the requested tree and finally copies the working tree (without git
//! metadata) into the destination, one task per file.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod operations;
pub mod system;
pub mod utils;

use anyhow::Result;
use config::Settings;
use git::{DiagnosticSink, ExecContext};
use operations::{FetchOperation, FetchReport};
use system::ProcessRunner;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use utils::Progress;

/// Main entry point for the gitrip library
///
/// # Errors
///
/// Returns the first error that stopped the pipeline; per-file copy
/// failures are reported in the returned `FetchReport` instead
pub async fn run(settings: Settings, cancel: CancellationToken) -> Result<FetchReport> {
    let sink = if settings.verbose {
        DiagnosticSink::Passthrough
    } else {
        DiagnosticSink::Quiet
    };
    let ctx = ExecContext::new()
        .with_cancel_token(cancel)
        .with_timeout(settings.timeout)
        .with_sink(sink);

    let runner = ProcessRunner::new();
    let report = FetchOperation::new(settings.request, &runner, ctx)
        .with_progress(Progress::new(!settings.verbose))
        .execute()
        .await?;

    info!(
        "\u{2713} Copied {} file(s) ({} bytes) to {}{}",
        report.files_copied,
        report.bytes_copied,
        report.destination.display(),
        if report.clone_skipped { " (cached clone)" } else { "" }
    );
    if !report.failures.is_empty() {
        warn!("{} file(s) could not be copied", report.failures.len());
    }

    Ok(report)
}
