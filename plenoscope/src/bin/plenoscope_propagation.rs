//! Propagate photons through a calibrated plenoscope.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use plenoscope::propagation::{
    propagate, propagate_raw_photons, EventTapePropagation, RawPhotonPropagation,
};
use plenoscope::shared_args::ExecutableArgs;
use shared::process::SystemRunner;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plenoscope photon propagation", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    executables: ExecutableArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propagate the Cherenkov photons of a CORSIKA run
    EventTape {
        #[arg(short, long, help = "CORSIKA run")]
        input: PathBuf,

        #[arg(short, long, help = "Output directory")]
        output: PathBuf,

        #[arg(short = 'l', long, help = "Light-field geometry")]
        light_field_geometry: PathBuf,

        #[arg(short, long, help = "Propagator configuration JSON")]
        config: PathBuf,

        #[arg(short, long, default_value_t = 0)]
        random_seed: u64,

        #[arg(long, help = "Write the origin of every photon")]
        photon_origins: bool,

        #[arg(long, help = "Stdout capture (defaults to <output>.stdout.txt)")]
        stdout: Option<PathBuf>,

        #[arg(long, help = "Stderr capture (defaults to <output>.stderr.txt)")]
        stderr: Option<PathBuf>,

        #[arg(long, help = "Propagation executable, overrides the registry")]
        executable: Option<PathBuf>,
    },
    /// Propagate a raw photon file, replacing any previous output
    RawPhotons {
        #[arg(short, long, help = "Raw photon file")]
        input: PathBuf,

        #[arg(short, long, help = "Output directory, removed first if present")]
        output: PathBuf,

        #[arg(short = 'l', long, help = "Light-field geometry")]
        light_field_geometry: PathBuf,

        #[arg(short, long, help = "Propagator configuration JSON")]
        config: PathBuf,

        #[arg(short, long, default_value_t = 0)]
        random_seed: u64,

        #[arg(long, help = "Propagation executable, overrides the registry")]
        executable: Option<PathBuf>,
    },
}

fn sibling(output: &std::path::Path, suffix: &str) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let resolver = args
        .executables
        .resolver()
        .context("Failed to set up executable lookup")?;
    let runner = SystemRunner;

    let exit_code = match args.command {
        Command::EventTape {
            input,
            output,
            light_field_geometry,
            config,
            random_seed,
            photon_origins,
            stdout,
            stderr,
            executable,
        } => {
            let propagation = EventTapePropagation {
                stdout_path: stdout.unwrap_or_else(|| sibling(&output, ".stdout.txt")),
                stderr_path: stderr.unwrap_or_else(|| sibling(&output, ".stderr.txt")),
                corsika_run_path: input,
                output_path: output,
                light_field_geometry_path: light_field_geometry,
                config_path: config,
                random_seed,
                photon_origins,
                executable_path: executable,
            };
            propagate(&propagation, resolver.as_ref(), &runner)?
        }
        Command::RawPhotons {
            input,
            output,
            light_field_geometry,
            config,
            random_seed,
            executable,
        } => {
            let mut propagation =
                RawPhotonPropagation::new(input, output, light_field_geometry, config)
                    .with_random_seed(random_seed);
            if let Some(path) = executable {
                propagation = propagation.with_executable_path(path);
            }
            propagate_raw_photons(&propagation, resolver.as_ref(), &runner)?
        }
    };

    if exit_code != 0 {
        bail!("Propagation exited with code {exit_code}");
    }
    info!("Propagation done");
    Ok(())
}
