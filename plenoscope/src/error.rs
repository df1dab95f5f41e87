use shared::executables::LookupError;
use thiserror::Error;

use crate::photometry::AlignError;
use crate::scenery::SceneryError;

/// Errors produced by the plenoscope tools.
///
/// A nonzero exit code of an external executable is not an error; it is
/// returned to the caller as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// Spectral input failed validation or alignment.
    #[error(transparent)]
    Align(#[from] AlignError),

    /// An executable path could not be resolved.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Seeds `random_seed..random_seed + num_blocks` do not fit in a `u64`.
    #[error("{num_blocks} blocks starting at seed {random_seed} overflow the seed range")]
    SeedOverflow { random_seed: u64, num_blocks: usize },

    /// The scenery lacks the light-field sensor.
    #[error(transparent)]
    Scenery(#[from] SceneryError),

    /// A JSON document could not be read or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or process-spawn failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
