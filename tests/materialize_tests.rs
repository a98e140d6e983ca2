//! Tests for copying a checked-out tree into the destination

use gitrip::error::FetchError;
use gitrip::operations::materialize;
use gitrip::utils::Progress;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Relative paths of every file below `root`, sorted
fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn test_many_files_are_copied_byte_for_byte() {
    let work = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    for dir in 0..6 {
        for file in 0..10 {
            let path = work.path().join(format!("dir{dir}/sub{}/file{file}.bin", file % 3));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let contents: Vec<u8> = (0..(dir * 1000 + file * 37))
                .map(|i| u8::try_from(i % 251).unwrap())
                .collect();
            fs::write(path, contents).unwrap();
        }
    }

    let report = materialize(work.path(), dest.path(), &Progress::hidden())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 60);
    assert!(report.failures.is_empty());
    let copied = files_under(dest.path());
    assert_eq!(copied, files_under(work.path()));
    for relative in copied {
        assert_eq!(
            fs::read(dest.path().join(&relative)).unwrap(),
            fs::read(work.path().join(&relative)).unwrap(),
            "{relative}"
        );
    }
}

#[tokio::test]
async fn test_git_metadata_is_never_copied() {
    let work = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    fs::create_dir_all(work.path().join(".git/refs/heads")).unwrap();
    fs::write(work.path().join(".git/config"), "[core]\n").unwrap();
    fs::create_dir_all(work.path().join("src/.github")).unwrap();
    fs::write(work.path().join("src/.github/ci.yml"), "on: push\n").unwrap();
    fs::write(work.path().join(".gitignore"), "target\n").unwrap();

    let report = materialize(work.path(), dest.path(), &Progress::hidden())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 2);
    assert!(!dest.path().join(".git").exists());
    assert_eq!(
        files_under(dest.path()),
        [".gitignore", "src/.github/ci.yml"]
    );
}

#[tokio::test]
async fn test_one_failed_copy_does_not_stop_the_others() {
    let work = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    fs::create_dir_all(work.path().join("docs")).unwrap();
    for index in 0..5 {
        fs::write(work.path().join(format!("docs/page{index}.md")), "page").unwrap();
    }
    // A directory squatting on a file's target makes that one copy fail
    fs::create_dir_all(dest.path().join("docs/page3.md")).unwrap();

    let report = materialize(work.path(), dest.path(), &Progress::hidden())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 4);
    assert_eq!(report.failures.len(), 1);
    match &report.failures[0] {
        FetchError::FileCopyFailed {
            source_path,
            dest_path,
            ..
        } => {
            assert!(source_path.ends_with("docs/page3.md"));
            assert_eq!(dest_path, &dest.path().join("docs/page3.md"));
        }
        other => panic!("unexpected failure: {other}"),
    }
    for index in [0, 1, 2, 4] {
        assert_eq!(
            fs::read_to_string(dest.path().join(format!("docs/page{index}.md"))).unwrap(),
            "page"
        );
    }
}

#[tokio::test]
async fn test_existing_destination_files_are_overwritten() {
    let work = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    fs::write(work.path().join("README.md"), "new").unwrap();
    fs::write(dest.path().join("README.md"), "old contents that are longer").unwrap();
    fs::write(dest.path().join("keep.txt"), "untouched").unwrap();

    let report = materialize(work.path(), dest.path(), &Progress::hidden())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(fs::read_to_string(dest.path().join("README.md")).unwrap(), "new");
    assert_eq!(fs::read_to_string(dest.path().join("keep.txt")).unwrap(), "untouched");
}

#[tokio::test]
async fn test_blocked_directory_is_a_traversal_error() {
    let work = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    fs::create_dir_all(work.path().join("docs")).unwrap();
    fs::write(work.path().join("docs/a.md"), "a").unwrap();
    fs::write(work.path().join("top.md"), "top").unwrap();
    // A file where the `docs` directory should go
    fs::write(dest.path().join("docs"), "blocker").unwrap();

    let err = materialize(work.path(), dest.path(), &Progress::hidden())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::TraversalFailed { .. }), "{err}");
    assert_eq!(err.exit_code(), 5);
    // Siblings of the blocked directory were still copied
    assert_eq!(fs::read_to_string(dest.path().join("top.md")).unwrap(), "top");
}
