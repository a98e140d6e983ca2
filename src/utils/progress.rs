//! Terminal progress reporting

use core::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const COPY_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}";

/// Spinner for the git stages and a counter for the copy stage
///
/// Hidden when disabled; indicatif also hides it when stderr is not a
/// terminal.
#[derive(Debug, Clone)]
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Create a progress reporter, drawing only when `enabled`
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self::hidden();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// A reporter that never draws
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Announce a sequential stage
    pub fn stage(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    /// Switch to counting file copies
    pub fn start_copy(&self) {
        self.bar.set_style(
            ProgressStyle::with_template(COPY_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar.set_length(0);
        self.bar.set_position(0);
        self.bar.set_message("Copying files");
    }

    /// A copy was issued
    pub fn file_queued(&self) {
        self.bar.inc_length(1);
    }

    /// A copy finished, successfully or not
    pub fn file_done(&self) {
        self.bar.inc(1);
    }

    /// Remove the progress display
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
