use log::{info, warn};
use shared::executables::{resolve_or, Executable, ExecutableResolver};
use shared::process::{Invocation, ProcessRunner};
use std::path::Path;

use crate::error::Result;

/// `<exe> --input <map_dir> --output <out_dir>`
pub fn reduce_invocation(executable_path: &Path, map_dir: &Path, out_dir: &Path) -> Invocation {
    Invocation::new(executable_path)
        .option("--input", map_dir)
        .option("--output", out_dir)
}

/// Fold the per-block results in `map_dir` into a light-field geometry at `out_dir`.
///
/// The reducing executable is looked up by name unless `executable_path` is
/// given. Its exit code is returned verbatim; incomplete map directories are
/// the executable's business.
pub fn reduce(
    map_dir: &Path,
    out_dir: &Path,
    executable_path: Option<&Path>,
    resolver: &dyn ExecutableResolver,
    runner: &dyn ProcessRunner,
) -> Result<i32> {
    let executable_path = resolve_or(executable_path, Executable::CalibrationReduce, resolver)?;
    let invocation = reduce_invocation(&executable_path, map_dir, out_dir);

    info!(
        "Reducing {} into {}",
        map_dir.display(),
        out_dir.display()
    );
    let exit_code = runner.run(&invocation)?;
    if exit_code != 0 {
        warn!("Reduction exited with code {exit_code}");
    }
    Ok(exit_code)
}
