//! Logical names of the merlict executables and their resolution to paths.
//!
//! Every tool in the kit refers to an executable by a fixed logical name
//! (e.g. `merlict-plenoscope-calibration-map`). An [`ExecutableResolver`]
//! turns such a name into a filesystem path. Callers that already know the
//! path pass it explicitly and the resolver is never consulted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The executables of the merlict development kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Executable {
    /// Single-process light-field calibration.
    Calibration,
    /// Map step of the light-field calibration, one block per call.
    CalibrationMap,
    /// Reduce step of the light-field calibration.
    CalibrationReduce,
    /// Propagation of Cherenkov photons from an event tape.
    PlenoscopePropagation,
    /// Propagation of raw photons.
    RawPhotonPropagation,
    EventioConverter,
    Propagate,
    CameraServer,
    ShowPhotons,
    Show,
}

impl Executable {
    /// All known executables, in registry order.
    pub const ALL: [Executable; 10] = [
        Executable::Calibration,
        Executable::CalibrationMap,
        Executable::CalibrationReduce,
        Executable::PlenoscopePropagation,
        Executable::RawPhotonPropagation,
        Executable::EventioConverter,
        Executable::Propagate,
        Executable::CameraServer,
        Executable::ShowPhotons,
        Executable::Show,
    ];

    /// The logical name, which is also the file name inside a build directory.
    pub fn name(&self) -> &'static str {
        match self {
            Executable::Calibration => "merlict-plenoscope-calibration",
            Executable::CalibrationMap => "merlict-plenoscope-calibration-map",
            Executable::CalibrationReduce => "merlict-plenoscope-calibration-reduce",
            Executable::PlenoscopePropagation => "merlict-plenoscope-propagation",
            Executable::RawPhotonPropagation => "merlict-plenoscope-raw-photon-propagation",
            Executable::EventioConverter => "merlict-eventio-converter",
            Executable::Propagate => "merlict-propagate",
            Executable::CameraServer => "merlict-cameraserver",
            Executable::ShowPhotons => "merlict-show-photons",
            Executable::Show => "merlict-show",
        }
    }

    /// Look up an executable by its logical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|exe| exe.name() == name)
    }
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while resolving an executable path.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no path registered for executable '{0}'")]
    NotRegistered(Executable),

    #[error("failed to read executable registry {path}: {source}")]
    Registry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves logical executable names to paths.
pub trait ExecutableResolver: Send + Sync {
    /// Return the path registered for `executable`.
    fn resolve(&self, executable: Executable) -> Result<PathBuf, LookupError>;
}

/// Use `explicit` when given, otherwise ask `resolver` for `executable`.
pub fn resolve_or(
    explicit: Option<&Path>,
    executable: Executable,
    resolver: &dyn ExecutableResolver,
) -> Result<PathBuf, LookupError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => resolver.resolve(executable),
    }
}

/// In-memory mapping from logical names to executable paths.
///
/// Serializes as a flat JSON object, `{"merlict-show": "/opt/build/merlict-show", ...}`.
/// Names that are not known executables are preserved so hand-edited registry
/// files survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutableRegistry {
    paths: BTreeMap<String, PathBuf>,
}

impl ExecutableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every known executable located in `build_dir`.
    ///
    /// Relative build directories are made absolute against the current
    /// working directory.
    pub fn for_build_dir(build_dir: &Path) -> std::io::Result<Self> {
        let build_dir = std::path::absolute(build_dir)?;
        let mut registry = Self::new();
        for exe in Executable::ALL {
            registry.insert(exe, build_dir.join(exe.name()));
        }
        Ok(registry)
    }

    /// Register (or replace) the path of an executable
    pub fn insert(&mut self, executable: Executable, path: impl Into<PathBuf>) {
        self.paths.insert(executable.name().to_string(), path.into());
    }

    /// Path registered for an executable, if any
    pub fn get(&self, executable: Executable) -> Option<&Path> {
        self.paths.get(executable.name()).map(PathBuf::as_path)
    }

    /// Iterate over `(name, path)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.paths
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl ExecutableResolver for ExecutableRegistry {
    fn resolve(&self, executable: Executable) -> Result<PathBuf, LookupError> {
        self.get(executable)
            .map(Path::to_path_buf)
            .ok_or(LookupError::NotRegistered(executable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for exe in Executable::ALL {
            assert_eq!(Executable::from_name(exe.name()), Some(exe));
        }
        assert_eq!(Executable::from_name("merlict-unknown"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Executable::ALL.iter().map(|exe| exe.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Executable::ALL.len());
    }

    #[test]
    fn test_build_dir_registry_covers_all_executables() {
        let registry = ExecutableRegistry::for_build_dir(Path::new("/opt/merlict/build")).unwrap();
        assert_eq!(registry.len(), 10);
        assert_eq!(
            registry.get(Executable::CalibrationMap).unwrap(),
            Path::new("/opt/merlict/build/merlict-plenoscope-calibration-map")
        );
    }

    #[test]
    fn test_relative_build_dir_becomes_absolute() {
        let registry = ExecutableRegistry::for_build_dir(Path::new("build")).unwrap();
        let path = registry.resolve(Executable::Show).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("build/merlict-show"));
    }

    #[test]
    fn test_missing_entry_is_lookup_error() {
        let registry = ExecutableRegistry::new();
        let err = registry.resolve(Executable::CalibrationReduce).unwrap_err();
        assert!(matches!(
            err,
            LookupError::NotRegistered(Executable::CalibrationReduce)
        ));
        assert!(err
            .to_string()
            .contains("merlict-plenoscope-calibration-reduce"));
    }

    #[test]
    fn test_explicit_path_wins() {
        // An empty registry would fail, so success proves it was not consulted
        let registry = ExecutableRegistry::new();
        let path = resolve_or(
            Some(Path::new("/usr/local/bin/map")),
            Executable::CalibrationMap,
            &registry,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/usr/local/bin/map"));
    }

    #[test]
    fn test_registry_json_is_flat_object() {
        let mut registry = ExecutableRegistry::new();
        registry.insert(Executable::Show, "/b/merlict-show");
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"{"merlict-show":"/b/merlict-show"}"#);

        let parsed: ExecutableRegistry =
            serde_json::from_str(r#"{"merlict-show":"/b/merlict-show","custom-tool":"/x"}"#)
                .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get(Executable::Show).unwrap(), Path::new("/b/merlict-show"));
    }
}
