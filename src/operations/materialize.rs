//! Concurrent transplant of a checked-out tree into the destination

use crate::error::FetchError;
use crate::git::METADATA_DIR;
use crate::utils::{Progress, mirrored_path};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt as _;
use tokio::task::JoinSet;
use tracing::{debug, error};
use walkdir::WalkDir;

/// Outcome of a materialization that got past the traversal
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub files_copied: usize,
    pub bytes_copied: u64,
    /// One `FileCopyFailed` per file that could not be copied
    pub failures: Vec<FetchError>,
}

/// Mirror `source_root` into `dest_root`, skipping git metadata
///
/// Directories are created as the walk reaches them; every regular file is
/// copied by its own task. All tasks are joined before this returns, and a
/// failed copy never stops its siblings.
///
/// # Errors
///
/// Returns `TraversalFailed` if:
/// - The destination root cannot be created
/// - An entry could not be read, or its mirrored directory created (the
///   first such error is returned once every copy has finished)
pub async fn materialize(
    source_root: &Path,
    dest_root: &Path,
    progress: &Progress,
) -> Result<MaterializeReport, FetchError> {
    fs::create_dir_all(dest_root).map_err(|err| FetchError::TraversalFailed {
        path: dest_root.to_path_buf(),
        message: format!("cannot create destination: {err}"),
    })?;

    let mut copies: JoinSet<Result<u64, FetchError>> = JoinSet::new();
    let mut in_flight = HashMap::new();
    let mut first_error: Option<FetchError> = None;

    let mut walker = WalkDir::new(source_root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != METADATA_DIR);

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map_or_else(|| source_root.to_path_buf(), Path::to_path_buf);
                record_first(&mut first_error, path, err.to_string());
                continue;
            }
        };

        let Some(target) = mirrored_path(source_root, entry.path(), dest_root) else {
            record_first(
                &mut first_error,
                entry.path().to_path_buf(),
                "entry lies outside the working directory".to_owned(),
            );
            continue;
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            // Copies below this directory are issued only after it exists.
            if let Err(err) = fs::create_dir_all(&target) {
                record_first(
                    &mut first_error,
                    entry.path().to_path_buf(),
                    format!("cannot create {}: {err}", target.display()),
                );
                walker.skip_current_dir();
            }
        } else if file_type.is_file() {
            let source = entry.into_path();
            let handle = copies.spawn(copy_file(source.clone(), target.clone()));
            in_flight.insert(handle.id(), (source, target));
            progress.file_queued();
        } else {
            debug!("Skipping {} (not a regular file)", entry.path().display());
        }
    }

    let mut report = MaterializeReport::default();
    while let Some(joined) = copies.join_next_with_id().await {
        progress.file_done();
        let outcome = match joined {
            Ok((id, outcome)) => {
                in_flight.remove(&id);
                outcome
            }
            Err(err) => {
                let (source_path, dest_path) = in_flight.remove(&err.id()).unwrap_or_default();
                Err(FetchError::FileCopyFailed {
                    source_path,
                    dest_path,
                    message: format!("copy task did not complete: {err}"),
                })
            }
        };

        match outcome {
            Ok(bytes) => {
                report.files_copied += 1;
                report.bytes_copied += bytes;
            }
            Err(failure) => {
                error!("{failure}");
                report.failures.push(failure);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

fn record_first(slot: &mut Option<FetchError>, path: PathBuf, message: String) {
    error!("Failed to traverse {}: {message}", path.display());
    if slot.is_none() {
        *slot = Some(FetchError::TraversalFailed { path, message });
    }
}

/// Stream one file's bytes and permissions to its destination
async fn copy_file(source: PathBuf, dest: PathBuf) -> Result<u64, FetchError> {
    let fail = |err: io::Error| FetchError::FileCopyFailed {
        source_path: source.clone(),
        dest_path: dest.clone(),
        message: err.to_string(),
    };

    let mut reader = tokio::fs::File::open(&source).await.map_err(&fail)?;
    let permissions = reader.metadata().await.map_err(&fail)?.permissions();
    let mut writer = tokio::fs::File::create(&dest).await.map_err(&fail)?;
    let bytes = tokio::io::copy(&mut reader, &mut writer)
        .await
        .map_err(&fail)?;
    writer.flush().await.map_err(&fail)?;
    tokio::fs::set_permissions(&dest, permissions)
        .await
        .map_err(&fail)?;

    debug!("Copied {} ({bytes} bytes)", dest.display());
    Ok(bytes)
}
