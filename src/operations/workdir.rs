//! Working directory selection and cleanup

use crate::error::FetchError;
use crate::git::{METADATA_DIR, RemoteCoordinates};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix of ephemeral working directories
const TEMP_PREFIX: &str = "gr.";

/// Where clones live between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// A fresh temporary directory per run, removed afterwards
    Ephemeral,
    /// A reusable mirror under `cache_root/<owner>/<project>`
    Persistent { cache_root: PathBuf },
}

/// Directory the git invocations run against
#[derive(Debug)]
pub enum WorkingDirectory {
    Ephemeral(TempDir),
    Persistent(PathBuf),
}

impl WorkingDirectory {
    /// Pick the working directory for `remote`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The temporary directory cannot be created (`WorkingDirectory`)
    /// - The remote URL does not name an owner and project
    ///   (`RemoteUrlUnparseable`)
    pub fn locate(mode: &CacheMode, remote: &str) -> Result<Self, FetchError> {
        match mode {
            CacheMode::Ephemeral => {
                let temp_dir = tempfile::Builder::new()
                    .prefix(TEMP_PREFIX)
                    .tempdir()
                    .map_err(|err| {
                        FetchError::working_directory(format!(
                            "failed to create temporary directory: {err}"
                        ))
                    })?;
                debug!("Using temporary working directory {}", temp_dir.path().display());
                Ok(Self::Ephemeral(temp_dir))
            }
            CacheMode::Persistent { cache_root } => {
                let path = RemoteCoordinates::parse(remote)?.cache_path(cache_root);
                debug!("Using cached working directory {}", path.display());
                Ok(Self::Persistent(path))
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Ephemeral(temp_dir) => temp_dir.path(),
            Self::Persistent(path) => path,
        }
    }

    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral(_))
    }

    /// Whether a previous run already cloned into this directory
    #[must_use]
    pub fn has_mirror(&self) -> bool {
        self.path().join(METADATA_DIR).exists()
    }

    /// Remove an ephemeral directory; persistent mirrors are kept
    ///
    /// Removal failures are logged, never returned.
    pub fn release(self) {
        match self {
            Self::Ephemeral(temp_dir) => {
                let path = temp_dir.path().to_path_buf();
                match temp_dir.close() {
                    Ok(()) => debug!("Removed temporary directory {}", path.display()),
                    Err(err) => warn!(
                        "Failed to remove temporary directory {}: {err}",
                        path.display()
                    ),
                }
            }
            Self::Persistent(path) => debug!("Keeping cached mirror {}", path.display()),
        }
    }
}
