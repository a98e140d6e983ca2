//! Shared utilities
//!
//! Path resolution, terminal progress reporting and interrupt handling

pub mod interrupt;
pub mod path;
pub mod progress;

pub use interrupt::*;
pub use path::*;
pub use progress::*;
