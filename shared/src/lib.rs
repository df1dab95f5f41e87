//! Shared components for the plenoscope tools.
//!
//! Holds the pieces every tool needs to talk to the merlict executables:
//! the registry that maps logical executable names to paths, its on-disk
//! storage, and the process runner abstraction.

pub mod config_storage;
pub mod executables;
pub mod process;
