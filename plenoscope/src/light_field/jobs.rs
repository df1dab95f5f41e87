use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shared::executables::{resolve_or, Executable, ExecutableResolver};
use shared::process::{Invocation, ProcessRunner};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// What to estimate: the input of [`make_jobs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapPlan {
    /// Scenery containing the instrument
    pub scenery_path: PathBuf,
    /// Photons thrown by a single block
    pub num_photons_per_block: u64,
    /// Directory receiving one sub-directory per block
    pub map_dir: PathBuf,
    /// Number of blocks
    pub num_blocks: usize,
    /// Seed of the first block; block `i` uses `random_seed + i`
    pub random_seed: u64,
    /// Mapping executable; looked up by name when `None`
    pub executable_path: Option<PathBuf>,
}

impl MapPlan {
    pub fn new(
        scenery_path: impl Into<PathBuf>,
        num_photons_per_block: u64,
        map_dir: impl Into<PathBuf>,
        num_blocks: usize,
    ) -> Self {
        Self {
            scenery_path: scenery_path.into(),
            num_photons_per_block,
            map_dir: map_dir.into(),
            num_blocks,
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
}

/// One block of the light-field estimate.
///
/// Descriptors are plain values: they can be cloned, serialized and shipped
/// to another process or machine before being run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobDescriptor {
    executable_path: PathBuf,
    scenery_path: PathBuf,
    random_seed: u64,
    map_dir: PathBuf,
    num_photons_per_block: u64,
}

impl JobDescriptor {
    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn scenery_path(&self) -> &Path {
        &self.scenery_path
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn map_dir(&self) -> &Path {
        &self.map_dir
    }

    pub fn num_photons_per_block(&self) -> u64 {
        self.num_photons_per_block
    }

    /// Where this block writes its partial result: `<map_dir>/<seed>`
    pub fn output_dir(&self) -> PathBuf {
        self.map_dir.join(self.random_seed.to_string())
    }

    /// `<exe> -s <scenery> -n <photons> -o <map_dir>/<seed> -r <seed>`
    pub fn invocation(&self) -> Invocation {
        Invocation::new(&self.executable_path)
            .option("-s", &self.scenery_path)
            .option("-n", self.num_photons_per_block.to_string())
            .option("-o", self.output_dir())
            .option("-r", self.random_seed.to_string())
    }
}

/// Enumerate the blocks of a light-field estimate.
///
/// Returns exactly `plan.num_blocks` descriptors, block `i` seeded with
/// `plan.random_seed + i`. Plans whose seeds would exceed `u64::MAX` are
/// rejected. The resolver is only asked for the mapping executable when the
/// plan does not name one.
pub fn make_jobs(plan: &MapPlan, resolver: &dyn ExecutableResolver) -> Result<Vec<JobDescriptor>> {
    let last_seed = match plan.num_blocks.checked_sub(1) {
        None => Some(plan.random_seed),
        Some(last_block) => u64::try_from(last_block)
            .ok()
            .and_then(|offset| plan.random_seed.checked_add(offset)),
    };
    if last_seed.is_none() {
        return Err(Error::SeedOverflow {
            random_seed: plan.random_seed,
            num_blocks: plan.num_blocks,
        });
    }

    let executable_path = resolve_or(
        plan.executable_path.as_deref(),
        Executable::CalibrationMap,
        resolver,
    )?;

    let jobs: Vec<JobDescriptor> = (0..plan.num_blocks as u64)
        .map(|block| JobDescriptor {
            executable_path: executable_path.clone(),
            scenery_path: plan.scenery_path.clone(),
            random_seed: plan.random_seed + block,
            map_dir: plan.map_dir.clone(),
            num_photons_per_block: plan.num_photons_per_block,
        })
        .collect();

    info!(
        "Planned {} blocks of {} photons, seeds starting at {}",
        jobs.len(),
        plan.num_photons_per_block,
        plan.random_seed
    );
    Ok(jobs)
}

/// Run one block and return the mapping executable's exit code verbatim.
///
/// Blocks until the executable exits. Only a failure to start it is an `Err`.
pub fn run_job(job: &JobDescriptor, runner: &dyn ProcessRunner) -> std::io::Result<i32> {
    let invocation = job.invocation();
    debug!("Block {}: {}", job.random_seed, invocation.command_line());

    let exit_code = runner.run(&invocation)?;
    if exit_code != 0 {
        warn!("Block {} exited with code {exit_code}", job.random_seed);
    }
    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::executables::{ExecutableRegistry, LookupError};
    use shared::process::mock::RecordingRunner;
    use std::collections::HashSet;

    fn registry() -> ExecutableRegistry {
        let mut registry = ExecutableRegistry::new();
        registry.insert(Executable::CalibrationMap, "/build/merlict-plenoscope-calibration-map");
        registry
    }

    #[test]
    fn test_seeds_increment_from_base() {
        for num_blocks in 0..25 {
            let plan = MapPlan::new("scenery.json", 1000, "map", num_blocks).with_random_seed(7);
            let jobs = make_jobs(&plan, &registry()).unwrap();

            assert_eq!(jobs.len(), num_blocks);
            let seeds: Vec<u64> = jobs.iter().map(JobDescriptor::random_seed).collect();
            let expected: Vec<u64> = (7..7 + num_blocks as u64).collect();
            assert_eq!(seeds, expected);

            let unique: HashSet<PathBuf> = jobs.iter().map(JobDescriptor::output_dir).collect();
            assert_eq!(unique.len(), num_blocks);
        }
    }

    #[test]
    fn test_zero_blocks_is_empty() {
        let plan = MapPlan::new("scenery.json", 1000, "map", 0);
        assert!(make_jobs(&plan, &registry()).unwrap().is_empty());
    }

    #[test]
    fn test_default_seed_is_zero() {
        let plan = MapPlan::new("scenery.json", 10, "map", 3);
        let jobs = make_jobs(&plan, &registry()).unwrap();
        assert_eq!(jobs[0].random_seed(), 0);
        assert_eq!(jobs[2].random_seed(), 2);
    }

    #[test]
    fn test_shared_fields() {
        let plan = MapPlan::new("/s/scenery.json", 250_000, "/tmp/map", 4).with_random_seed(100);
        let jobs = make_jobs(&plan, &registry()).unwrap();

        for job in &jobs {
            assert_eq!(job.scenery_path(), Path::new("/s/scenery.json"));
            assert_eq!(job.map_dir(), Path::new("/tmp/map"));
            assert_eq!(job.num_photons_per_block(), 250_000);
            assert_eq!(
                job.executable_path(),
                Path::new("/build/merlict-plenoscope-calibration-map")
            );
        }
    }

    #[test]
    fn test_explicit_executable_skips_lookup() {
        // The empty registry would fail the lookup
        let plan = MapPlan::new("scenery.json", 10, "map", 2).with_executable_path("/opt/map");
        let jobs = make_jobs(&plan, &ExecutableRegistry::new()).unwrap();
        assert_eq!(jobs[1].executable_path(), Path::new("/opt/map"));
    }

    #[test]
    fn test_lookup_failure_surfaces() {
        let plan = MapPlan::new("scenery.json", 10, "map", 2);
        let result = make_jobs(&plan, &ExecutableRegistry::new());
        assert!(matches!(
            result,
            Err(Error::Lookup(LookupError::NotRegistered(
                Executable::CalibrationMap
            )))
        ));
    }

    #[test]
    fn test_seed_overflow_is_rejected() {
        let plan = MapPlan::new("scenery.json", 1, "map", 3).with_random_seed(u64::MAX - 1);
        let result = make_jobs(&plan, &registry());
        assert!(matches!(
            result,
            Err(Error::SeedOverflow {
                random_seed,
                num_blocks: 3,
            }) if random_seed == u64::MAX - 1
        ));
    }

    #[test]
    fn test_seeds_up_to_max_are_accepted() {
        let plan = MapPlan::new("scenery.json", 1, "map", 2).with_random_seed(u64::MAX - 1);
        let jobs = make_jobs(&plan, &registry()).unwrap();
        let seeds: Vec<u64> = jobs.iter().map(JobDescriptor::random_seed).collect();
        assert_eq!(seeds, vec![u64::MAX - 1, u64::MAX]);
        assert_eq!(jobs[1].output_dir(), Path::new("map").join(u64::MAX.to_string()));
    }

    #[test]
    fn test_run_job_argument_contract() {
        let plan = MapPlan::new("/s/scenery.json", 1000, "/tmp/map", 1).with_random_seed(42);
        let job = make_jobs(&plan, &registry()).unwrap().remove(0);
        let runner = RecordingRunner::succeeding();

        assert_eq!(run_job(&job, &runner).unwrap(), 0);

        let invocation = runner.last_invocation().unwrap();
        assert_eq!(
            invocation.program(),
            Path::new("/build/merlict-plenoscope-calibration-map")
        );
        assert_eq!(
            invocation.args_lossy(),
            vec!["-s", "/s/scenery.json", "-n", "1000", "-o", "/tmp/map/42", "-r", "42"]
        );
        assert!(invocation.stdout_path().is_none());
    }

    #[test]
    fn test_run_job_passes_exit_code_through() {
        let plan = MapPlan::new("scenery.json", 10, "map", 3);
        let jobs = make_jobs(&plan, &registry()).unwrap();
        let runner = RecordingRunner::succeeding().with_exit_codes([0, 1, 137]);

        let codes: Vec<i32> = jobs.iter().map(|job| run_job(job, &runner).unwrap()).collect();
        assert_eq!(codes, vec![0, 1, 137]);
    }

    #[test]
    fn test_descriptor_json_round_trip() {
        let plan = MapPlan::new("scenery.json", 10, "map", 1).with_random_seed(5);
        let job = make_jobs(&plan, &registry()).unwrap().remove(0);

        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"random_seed\":5"));
        let parsed: JobDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, job);
    }
}
