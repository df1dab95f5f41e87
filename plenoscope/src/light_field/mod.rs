//! Map/reduce estimate of the plenoscope's light-field geometry.
//!
//! The estimate is split into independent blocks. Each block throws
//! `num_photons_per_block` photons through the scenery with its own random
//! seed and writes a partial result to `<map_dir>/<seed>`. Once every block
//! is done the reduce step folds `map_dir` into one light-field geometry.
//!
//! ```text
//! make_jobs ──> [job seed=s] ──run_job──> map_dir/s ─┐
//!           ──> [job seed=s+1] ─run_job─> map_dir/s+1├─reduce──> light-field geometry
//!           ──> ...                                  ┘
//! ```
//!
//! Nothing here schedules jobs. Callers run [`run_job`] on whatever
//! threads, processes or machines they like; distinct seeds guarantee
//! distinct output directories. Failed blocks (nonzero exit codes) are
//! reported to the caller and never retried here. Calling [`reduce`] before
//! all blocks have finished is the caller's mistake and goes undetected.

pub mod jobs;
pub mod reduce;

pub use jobs::{make_jobs, run_job, JobDescriptor, MapPlan};
pub use reduce::reduce;
