//! Git command construction
//!
//! Each command shape gitrip needs is a distinct [`GitCommand`] variant with
//! its own required fields. Building a command never runs anything: it only
//! yields a [`CommandSpec`] that the executor consumes.

use std::path::{Path, PathBuf};

/// Name of the executable every [`GitCommand`] runs
pub const GIT_PROGRAM: &str = "git";

/// One invocation of git, identified by its shape
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GitCommand {
    /// Shallow clone that leaves the working tree unpopulated
    Clone {
        remote: String,
        dest: Option<PathBuf>,
    },
    /// Restrict what a later checkout materializes
    SparseSet { patterns: Vec<String> },
    /// Check out a branch, tag or commit
    Checkout { reference: String },
}

/// Side effect that must succeed before the subprocess is spawned
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreExecAction {
    /// Create a directory and all of its parents
    CreateDirAll(PathBuf),
}

/// Fully built invocation: program, ordered arguments and setup actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    pre_exec: Vec<PreExecAction>,
}

impl GitCommand {
    /// `git clone --depth 1 --no-checkout <remote> [<dest>]`
    ///
    /// An empty `dest` lets git pick the directory name itself.
    #[must_use]
    pub fn shallow_clone(remote: impl Into<String>, dest: impl AsRef<Path>) -> Self {
        let dest = dest.as_ref();
        Self::Clone {
            remote: remote.into(),
            dest: (!dest.as_os_str().is_empty()).then(|| dest.to_path_buf()),
        }
    }

    /// `git sparse-checkout set --no-cone <patterns...>`
    ///
    /// Patterns are forwarded verbatim; matching is git's business. An
    /// empty list is accepted and leads to a checkout without files.
    #[must_use]
    pub fn sparse_set<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SparseSet {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// `git checkout <reference>`
    #[must_use]
    pub fn checkout(reference: impl Into<String>) -> Self {
        Self::Checkout {
            reference: reference.into(),
        }
    }

    /// Short, stable name of the command shape
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match *self {
            Self::Clone { .. } => "clone",
            Self::SparseSet { .. } => "sparse-checkout",
            Self::Checkout { .. } => "checkout",
        }
    }

    /// Build the invocation for this command
    #[must_use]
    pub fn to_spec(&self) -> CommandSpec {
        let mut args: Vec<String> = Vec::with_capacity(8);
        let mut pre_exec = Vec::new();

        match self {
            Self::Clone { remote, dest } => {
                args.extend(["clone", "--depth", "1", "--no-checkout"].map(str::to_owned));
                args.push(remote.clone());
                if let Some(dest) = dest {
                    pre_exec.push(PreExecAction::CreateDirAll(dest.clone()));
                    args.push(dest.to_string_lossy().into_owned());
                }
            }
            Self::SparseSet { patterns } => {
                args.extend(["sparse-checkout", "set", "--no-cone"].map(str::to_owned));
                args.extend(patterns.iter().cloned());
            }
            Self::Checkout { reference } => {
                args.push("checkout".to_owned());
                args.push(reference.clone());
            }
        }

        CommandSpec {
            program: GIT_PROGRAM.to_owned(),
            args,
            pre_exec,
        }
    }
}

impl CommandSpec {
    /// Run the same arguments with another git executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Executable to spawn
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, in order, excluding the program name
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Actions to run before spawning
    #[must_use]
    pub fn pre_exec(&self) -> &[PreExecAction] {
        &self.pre_exec
    }

    /// Render the command line the way a user would type it
    #[must_use]
    pub fn command_line(&self) -> String {
        core::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl core::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Single-quote an argument when a shell would otherwise split or expand it
fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '=' | ',' | '+')
        });
    if plain {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
