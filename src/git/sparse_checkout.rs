//! Git sparse checkout implementation

use crate::git::{ExecContext, GitCommand, METADATA_DIR};
use crate::system::CommandRunner;
use anyhow::{Context as _, Result};
use core::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The three git invocations that produce a sparse working copy
///
/// Clone, sparse-checkout and checkout always run in that order against the
/// same working directory; each step depends on the on-disk effect of the
/// previous one.
#[non_exhaustive]
pub struct SparseCheckout<'run> {
    pub remote: &'run str,
    pub patterns: &'run [String],
    pub reference: &'run str,
    runner: &'run dyn CommandRunner,
    ctx: &'run ExecContext,
}

impl<'run> SparseCheckout<'run> {
    /// Create a new sparse checkout sequence
    #[must_use]
    pub fn new(
        runner: &'run dyn CommandRunner,
        ctx: &'run ExecContext,
        remote: &'run str,
        patterns: &'run [String],
        reference: &'run str,
    ) -> Self {
        Self {
            remote,
            patterns,
            reference,
            runner,
            ctx,
        }
    }

    /// Shallow clone without checkout into `repo_path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The destination directory cannot be created
    /// - `git clone` fails, is cancelled or times out
    pub async fn clone_repository(&self, repo_path: &Path) -> Result<()> {
        debug!("Cloning {} into {}", self.remote, repo_path.display());
        self.runner
            .run(&GitCommand::shallow_clone(self.remote, repo_path), None, self.ctx)
            .await
            .with_context(|| format!("clone stage failed for '{}'", self.remote))?;
        debug!("Repository cloned");
        Ok(())
    }

    /// Restrict the working copy to the requested patterns
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `git sparse-checkout set` fails, is cancelled or times out
    pub async fn set_sparse_patterns(&self, repo_path: &Path) -> Result<()> {
        debug!("Setting sparse checkout patterns: {:?}", self.patterns);
        self.runner
            .run(
                &GitCommand::sparse_set(self.patterns.iter().cloned()),
                Some(repo_path),
                self.ctx,
            )
            .await
            .context("sparse-checkout stage failed")?;
        debug!("Sparse checkout patterns set");
        Ok(())
    }

    /// Check out the requested reference, materializing the selected paths
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `git checkout` fails, is cancelled or times out
    pub async fn checkout_reference(&self, repo_path: &Path) -> Result<()> {
        debug!("checkout_reference -> Checking out reference: {}", self.reference);
        self.runner
            .run(&GitCommand::checkout(self.reference), Some(repo_path), self.ctx)
            .await
            .with_context(|| format!("checkout stage failed for '{}'", self.reference))?;
        debug!("checkout_reference -> Reference checked out successfully");
        Ok(())
    }

    /// Describe what the checkout left in `repo_path`
    ///
    /// Useful in debug output when the requested patterns matched nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The diagnostics cannot be formatted
    pub fn checkout_diagnostics(&self, repo_path: &Path) -> Result<String> {
        let mut diagnostics = String::new();

        writeln!(
            diagnostics,
            "Sparse checkout diagnostics:\n  Repository: {}\n  Reference: {}\n  Requested patterns: {}",
            self.remote,
            self.reference,
            self.patterns.join(", ")
        )?;
        writeln!(diagnostics, "  Working directory: {}", repo_path.display())?;

        diagnostics.push_str("  Checked out entries:\n");
        if let Ok(entries) = fs::read_dir(repo_path) {
            let mut found_items: Vec<String> = entries
                .flatten()
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name != METADATA_DIR)
                .collect();
            found_items.sort();

            if found_items.is_empty() {
                writeln!(diagnostics, "    (empty - no files were checked out)")?;
            } else {
                for item in found_items {
                    writeln!(diagnostics, "    - {item}")?;
                }
            }
        } else {
            writeln!(diagnostics, "    (unable to read directory)")?;
        }

        Ok(diagnostics)
    }
}
