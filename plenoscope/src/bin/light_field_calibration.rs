//! Estimate a plenoscope's light-field geometry with map/reduce.
//!
//! Blocks run in parallel on a rayon pool. Failed blocks are listed by seed
//! and do not stop their siblings; the reduction only runs when every block
//! succeeded, unless `--reduce-anyway` is given.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use plenoscope::light_field::{make_jobs, reduce, run_job, JobDescriptor, MapPlan};
use plenoscope::shared_args::ExecutableArgs;
use rayon::prelude::*;
use shared::process::SystemRunner;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Light-field geometry calibration", long_about = None)]
struct Args {
    #[arg(short, long, help = "Scenery containing the plenoscope")]
    scenery: PathBuf,

    #[arg(short, long, help = "Output directory of the light-field geometry")]
    output: PathBuf,

    #[arg(long, help = "Directory for the per-block results (defaults to <output>.map)")]
    map_dir: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Photons per block", default_value_t = 1_000_000)]
    num_photons_per_block: u64,

    #[arg(short = 'b', long, help = "Number of blocks", default_value_t = 16)]
    num_blocks: usize,

    #[arg(short, long, help = "Seed of the first block", default_value_t = 0)]
    random_seed: u64,

    #[arg(long, help = "Worker threads (defaults to the number of cores)")]
    threads: Option<usize>,

    #[arg(long, help = "Mapping executable, overrides the registry")]
    map_executable: Option<PathBuf>,

    #[arg(long, help = "Reducing executable, overrides the registry")]
    reduce_executable: Option<PathBuf>,

    #[arg(long, help = "Reduce even if some blocks failed")]
    reduce_anyway: bool,

    #[command(flatten)]
    executables: ExecutableArgs,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let resolver = args
        .executables
        .resolver()
        .context("Failed to set up executable lookup")?;
    let map_dir = args.map_dir.clone().unwrap_or_else(|| {
        let mut name = args.output.clone().into_os_string();
        name.push(".map");
        PathBuf::from(name)
    });

    let mut plan = MapPlan::new(
        &args.scenery,
        args.num_photons_per_block,
        &map_dir,
        args.num_blocks,
    )
    .with_random_seed(args.random_seed);
    if let Some(path) = &args.map_executable {
        plan = plan.with_executable_path(path);
    }

    let jobs = make_jobs(&plan, resolver.as_ref()).context("Failed to plan blocks")?;
    std::fs::create_dir_all(&map_dir)
        .with_context(|| format!("Failed to create {}", map_dir.display()))?;

    let pool = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = args.threads {
            builder = builder.num_threads(threads);
        }
        builder.build().context("Failed to start worker pool")?
    };

    let runner = SystemRunner;
    let failed: Vec<(u64, String)> = pool.install(|| {
        jobs.par_iter()
            .filter_map(|job: &JobDescriptor| match run_job(job, &runner) {
                Ok(0) => None,
                Ok(code) => Some((job.random_seed(), format!("exit code {code}"))),
                Err(e) => Some((job.random_seed(), e.to_string())),
            })
            .collect()
    });

    for (seed, reason) in &failed {
        error!("Block {seed} failed: {reason}");
    }
    info!(
        "{} of {} blocks succeeded",
        jobs.len() - failed.len(),
        jobs.len()
    );

    if !failed.is_empty() && !args.reduce_anyway {
        bail!("{} blocks failed, not reducing", failed.len());
    }

    let exit_code = reduce(
        &map_dir,
        &args.output,
        args.reduce_executable.as_deref(),
        resolver.as_ref(),
        &runner,
    )?;
    if exit_code != 0 {
        bail!("Reduction exited with code {exit_code}");
    }

    info!("Light-field geometry written to {}", args.output.display());
    Ok(())
}
