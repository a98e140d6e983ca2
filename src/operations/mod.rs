//! Operations module
//!
//! Coordinates fetch runs: working directory selection, the git sequence and
//! materialization into the destination

pub mod fetch;
pub mod materialize;
pub mod workdir;

pub use fetch::*;
pub use materialize::*;
pub use workdir::*;
