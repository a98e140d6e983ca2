//! Path resolution utilities

use crate::error::FetchError;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {
                // Skip '.' components
            }
            Component::ParentDir => {
                // Pop the last normal component; keep leading '..' and never
                // climb above the root
                match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    _ => components.push(component),
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

/// Resolve the destination to an absolute, normalized path
///
/// The path does not need to exist yet.
///
/// # Errors
///
/// Returns `DestinationResolutionFailed` if:
/// - The path is empty
/// - The current directory cannot be determined for a relative path
pub fn resolve_destination(dest: &Path) -> Result<PathBuf, FetchError> {
    let absolute =
        std::path::absolute(dest).map_err(|source| FetchError::DestinationResolutionFailed {
            path: dest.to_path_buf(),
            source,
        })?;
    Ok(normalize_path(&absolute))
}

/// Path of `entry` relative to `root`, rebased onto `dest_root`
#[must_use]
pub fn mirrored_path(root: &Path, entry: &Path, dest_root: &Path) -> Option<PathBuf> {
    entry
        .strip_prefix(root)
        .ok()
        .map(|relative| dest_root.join(relative))
}
