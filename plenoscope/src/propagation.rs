//! Propagation of photons through a calibrated plenoscope.
//!
//! Both operations fill in the argument contract of an external propagation
//! executable, run it to completion and hand back its exit code.

use log::{debug, info, warn};
use shared::executables::{resolve_or, Executable, ExecutableResolver};
use shared::process::{Invocation, ProcessRunner};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Flag asking the propagation executables for per-photon truth output
pub const ALL_TRUTH_FLAG: &str = "--all_truth";

/// Suffix appended to the output path for the captured stdout of raw-photon runs
pub const STDOUT_SUFFIX: &str = ".stdout.txt";

/// Suffix appended to the output path for the captured stderr of raw-photon runs
pub const STDERR_SUFFIX: &str = ".stderr.txt";

/// Propagation of the Cherenkov photons of a CORSIKA event tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTapePropagation {
    pub corsika_run_path: PathBuf,
    pub output_path: PathBuf,
    pub light_field_geometry_path: PathBuf,
    /// Propagator configuration, see [`crate::PropagatorConfig::save_to_file`]
    pub config_path: PathBuf,
    pub random_seed: u64,
    /// Write the origin of every photon next to the events
    pub photon_origins: bool,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    /// Propagation executable; looked up by name when `None`
    pub executable_path: Option<PathBuf>,
}

impl EventTapePropagation {
    /// `<exe> -l <lfg> -c <config> -i <corsika_run> -o <output> -r <seed> [--all_truth]`
    pub fn invocation(&self, executable_path: &Path) -> Invocation {
        let invocation = Invocation::new(executable_path)
            .option("-l", &self.light_field_geometry_path)
            .option("-c", &self.config_path)
            .option("-i", &self.corsika_run_path)
            .option("-o", &self.output_path)
            .option("-r", self.random_seed.to_string());

        let invocation = if self.photon_origins {
            invocation.arg(ALL_TRUTH_FLAG)
        } else {
            invocation
        };

        invocation
            .stdout_to(&self.stdout_path)
            .stderr_to(&self.stderr_path)
    }
}

/// Propagation of a raw photon file.
///
/// Output always includes per-photon truth. A previous output directory is
/// replaced, never merged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPhotonPropagation {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub light_field_geometry_path: PathBuf,
    pub config_path: PathBuf,
    pub random_seed: u64,
    pub executable_path: Option<PathBuf>,
}

impl RawPhotonPropagation {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        light_field_geometry_path: impl Into<PathBuf>,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            light_field_geometry_path: light_field_geometry_path.into(),
            config_path: config_path.into(),
            random_seed: 0,
            executable_path: None,
        }
    }

    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    pub fn with_executable_path(mut self, executable_path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(executable_path.into());
        self
    }

    /// `<output>.stdout.txt`
    pub fn stdout_path(&self) -> PathBuf {
        with_suffix(&self.output_path, STDOUT_SUFFIX)
    }

    /// `<output>.stderr.txt`
    pub fn stderr_path(&self) -> PathBuf {
        with_suffix(&self.output_path, STDERR_SUFFIX)
    }

    /// `<exe> -l <lfg> -c <config> -i <input> -o <output> --all_truth -r <seed>`
    pub fn invocation(&self, executable_path: &Path) -> Invocation {
        Invocation::new(executable_path)
            .option("-l", &self.light_field_geometry_path)
            .option("-c", &self.config_path)
            .option("-i", &self.input_path)
            .option("-o", &self.output_path)
            .arg(ALL_TRUTH_FLAG)
            .option("-r", self.random_seed.to_string())
            .stdout_to(self.stdout_path())
            .stderr_to(self.stderr_path())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Run the event-tape propagation and return its exit code verbatim.
pub fn propagate(
    propagation: &EventTapePropagation,
    resolver: &dyn ExecutableResolver,
    runner: &dyn ProcessRunner,
) -> Result<i32> {
    let executable_path = resolve_or(
        propagation.executable_path.as_deref(),
        Executable::PlenoscopePropagation,
        resolver,
    )?;
    let invocation = propagation.invocation(&executable_path);

    info!(
        "Propagating {} into {}",
        propagation.corsika_run_path.display(),
        propagation.output_path.display()
    );
    debug!("{}", invocation.command_line());

    let exit_code = runner.run(&invocation)?;
    if exit_code != 0 {
        warn!(
            "Propagation exited with code {exit_code}, see {}",
            propagation.stderr_path.display()
        );
    }
    Ok(exit_code)
}

/// Run the raw-photon propagation and return its exit code verbatim.
///
/// Anything already at `output_path` is deleted first. The executable is
/// resolved before that, so a failed lookup leaves existing output alone.
pub fn propagate_raw_photons(
    propagation: &RawPhotonPropagation,
    resolver: &dyn ExecutableResolver,
    runner: &dyn ProcessRunner,
) -> Result<i32> {
    let executable_path = resolve_or(
        propagation.executable_path.as_deref(),
        Executable::RawPhotonPropagation,
        resolver,
    )?;

    remove_previous_output(&propagation.output_path)?;

    let invocation = propagation.invocation(&executable_path);
    info!(
        "Propagating raw photons {} into {}",
        propagation.input_path.display(),
        propagation.output_path.display()
    );
    debug!("{}", invocation.command_line());

    let exit_code = runner.run(&invocation)?;
    if exit_code != 0 {
        warn!(
            "Raw-photon propagation exited with code {exit_code}, see {}",
            propagation.stderr_path().display()
        );
    }
    Ok(exit_code)
}

fn remove_previous_output(output_path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(output_path) {
        Ok(meta) if meta.is_dir() => {
            warn!("Removing previous output {}", output_path.display());
            std::fs::remove_dir_all(output_path)
        }
        Ok(_) => {
            warn!("Removing previous output {}", output_path.display());
            std::fs::remove_file(output_path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
