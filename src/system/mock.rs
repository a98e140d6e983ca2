//! Mock runner implementation for testing

use super::CommandRunner;
use crate::error::FetchError;
use crate::git::{ExecContext, ExecutionResult, GitCommand};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Recorded call to [`MockRunner::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: GitCommand,
    pub cwd: Option<PathBuf>,
}

/// Stand-in for git that works on the real filesystem
///
/// `MockRunner` holds the file tree of a pretend remote revision. Clone
/// creates an empty `.git` marker, sparse-checkout remembers the patterns
/// and checkout writes the files selected by those patterns into the
/// working directory. Patterns select a file when they name it or one of
/// its parent directories, a deliberately small subset of git's rules.
///
/// # Example
/// ```
/// use gitrip::system::MockRunner;
///
/// let runner = MockRunner::new()
///     .with_file("docs/guide.md", b"# Guide")
///     .with_failure("checkout", 1, "error: pathspec 'nope' did not match");
///
/// assert_eq!(runner.count("clone"), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockRunner {
    state: Arc<RwLock<MockRunnerState>>,
}

#[derive(Default)]
struct MockRunnerState {
    tree: BTreeMap<PathBuf, Vec<u8>>,
    failures: HashMap<String, (i32, String)>,
    patterns: HashMap<PathBuf, Vec<String>>,
    invocations: Vec<Invocation>,
}

impl MockRunner {
    /// Create a new `MockRunner` with an empty remote tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the remote tree (builder pattern)
    #[must_use]
    pub fn with_file<P: AsRef<Path>>(self, path: P, contents: &[u8]) -> Self {
        self.write_state()
            .tree
            .insert(path.as_ref().to_path_buf(), contents.to_vec());
        self
    }

    /// Make every invocation of the named command fail (builder pattern)
    ///
    /// `name` is a [`GitCommand::name`]: `clone`, `sparse-checkout` or
    /// `checkout`.
    #[must_use]
    pub fn with_failure(self, name: &str, status: i32, stderr: &str) -> Self {
        self.write_state()
            .failures
            .insert(name.to_owned(), (status, stderr.to_owned()));
        self
    }

    /// Every invocation so far, in order
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.read_state().invocations.clone()
    }

    /// Number of invocations of the named command
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.read_state()
            .invocations
            .iter()
            .filter(|invocation| invocation.command.name() == name)
            .count()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, MockRunnerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, MockRunnerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn selected(patterns: &[String], path: &Path) -> bool {
        patterns.iter().any(|pattern| {
            let pattern = pattern.trim_matches('/');
            !pattern.is_empty() && path.starts_with(pattern)
        })
    }

    fn simulate(
        state: &mut MockRunnerState,
        command: &GitCommand,
        cwd: Option<&Path>,
    ) -> std::io::Result<()> {
        let base = cwd.map_or_else(PathBuf::new, Path::to_path_buf);
        match command {
            GitCommand::Clone { dest, .. } => {
                let root = dest.as_ref().map_or_else(|| base.clone(), |dest| base.join(dest));
                fs::create_dir_all(root.join(".git"))?;
                fs::write(root.join(".git").join("HEAD"), b"ref: refs/heads/main\n")?;
            }
            GitCommand::SparseSet { patterns } => {
                state.patterns.insert(base, patterns.clone());
            }
            GitCommand::Checkout { .. } => {
                let patterns = state.patterns.get(&base).cloned().unwrap_or_default();
                for (path, contents) in &state.tree {
                    if !Self::selected(&patterns, path) {
                        continue;
                    }
                    let target = base.join(path);
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(target, contents)?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        command: &GitCommand,
        cwd: Option<&Path>,
        ctx: &ExecContext,
    ) -> Result<ExecutionResult, FetchError> {
        let command_line = command.to_spec().command_line();
        if ctx.is_cancelled() {
            return Err(FetchError::Cancelled { command_line });
        }

        let mut state = self.write_state();
        state.invocations.push(Invocation {
            command: command.clone(),
            cwd: cwd.map(Path::to_path_buf),
        });

        if let Some((status, stderr)) = state.failures.get(command.name()).cloned() {
            return Err(FetchError::SubprocessFailed {
                command_line,
                status: Some(status),
                stderr,
            });
        }

        if let Err(err) = Self::simulate(&mut state, command, cwd) {
            return Err(FetchError::SubprocessFailed {
                command_line,
                status: Some(128),
                stderr: err.to_string(),
            });
        }
        drop(state);

        Ok(ExecutionResult {
            command_line,
            ..ExecutionResult::default()
        })
    }
}
