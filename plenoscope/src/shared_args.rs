use clap::Args;
use shared::config_storage::ConfigStorage;
use shared::executables::{ExecutableRegistry, ExecutableResolver};
use std::path::PathBuf;

/// How binaries locate the merlict executables
#[derive(Args, Debug, Clone, Default)]
pub struct ExecutableArgs {
    /// Executable registry file (defaults to ~/.merlict_develompment_kit_python.json)
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Use every executable from this build directory, ignoring any registry
    #[arg(long, conflicts_with = "registry")]
    pub build_dir: Option<PathBuf>,
}

impl ExecutableArgs {
    /// Registry file the arguments point at, `None` when `--build-dir` is used
    pub fn storage(&self) -> std::io::Result<Option<ConfigStorage>> {
        if self.build_dir.is_some() {
            return Ok(None);
        }
        match &self.registry {
            Some(path) => Ok(Some(ConfigStorage::with_path(path.clone()))),
            None => ConfigStorage::new().map(Some),
        }
    }

    pub fn resolver(&self) -> std::io::Result<Box<dyn ExecutableResolver>> {
        if let Some(build_dir) = &self.build_dir {
            return Ok(Box::new(ExecutableRegistry::for_build_dir(build_dir)?));
        }
        match self.storage()? {
            Some(storage) => Ok(Box::new(storage)),
            None => Ok(Box::new(ExecutableRegistry::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use shared::executables::Executable;
    use std::path::Path;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        executables: ExecutableArgs,
    }

    #[test]
    fn test_build_dir_resolver() {
        let cli = TestCli::parse_from(["test", "--build-dir", "/opt/merlict/build"]);
        let resolver = cli.executables.resolver().unwrap();
        assert_eq!(
            resolver.resolve(Executable::CalibrationReduce).unwrap(),
            Path::new("/opt/merlict/build/merlict-plenoscope-calibration-reduce")
        );
    }

    #[test]
    fn test_registry_and_build_dir_conflict() {
        let result = TestCli::try_parse_from(["test", "--registry", "r.json", "--build-dir", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_registry_path() {
        let cli = TestCli::parse_from(["test", "--registry", "/tmp/reg.json"]);
        let storage = cli.executables.storage().unwrap().unwrap();
        assert_eq!(storage.registry_path(), Path::new("/tmp/reg.json"));
    }
}
