//! Git operations module
//!
//! Builds and runs the git invocations behind a sparse fetch

pub mod command;
pub mod executor;
pub mod remote;
pub mod sparse_checkout;

pub use command::*;
pub use executor::*;
pub use remote::*;
pub use sparse_checkout::*;

/// Name of git's metadata directory, never copied to the destination
pub const METADATA_DIR: &str = ".git";
