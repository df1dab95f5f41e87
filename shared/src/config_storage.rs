//! Configuration storage for the executable registry.
//!
//! The registry of executable paths is stored as a single JSON file,
//! `~/.merlict_develompment_kit_python.json` by default. Reading a missing
//! registry creates it with every executable located in `./build`.

use crate::executables::{Executable, ExecutableRegistry, ExecutableResolver, LookupError};
use log::info;
use std::path::{Path, PathBuf};

/// File name of the registry inside the home directory.
///
/// Spelled exactly as existing installations write it, typo included, so
/// their registries keep working.
pub const REGISTRY_FILE_NAME: &str = ".merlict_develompment_kit_python.json";

/// Build directory assumed when a registry has to be created from scratch
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Configuration storage manager for the executable registry.
#[derive(Debug, Clone)]
pub struct ConfigStorage {
    /// Path of the registry JSON file (e.g., ~/.merlict_develompment_kit_python.json)
    registry_path: PathBuf,
}

impl ConfigStorage {
    /// Create a new config storage with the default path in the home directory
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
        let registry_path = PathBuf::from(home).join(REGISTRY_FILE_NAME);
        Ok(Self { registry_path })
    }

    /// Create a new config storage with a custom registry file
    pub fn with_path(registry_path: PathBuf) -> Self {
        Self { registry_path }
    }

    /// Get the registry file path
    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Whether the registry file exists
    pub fn exists(&self) -> bool {
        self.registry_path.exists()
    }

    /// Load the registry from its JSON file
    pub fn load_registry(&self) -> std::io::Result<ExecutableRegistry> {
        let json = std::fs::read_to_string(&self.registry_path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save the registry, creating the parent directory if needed.
    pub fn save_registry(&self, registry: &ExecutableRegistry) -> std::io::Result<()> {
        if let Some(parent) = self.registry_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(registry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.registry_path, json)
    }

    /// Load the registry, first writing the default one if the file is missing.
    pub fn read_or_init(&self) -> std::io::Result<ExecutableRegistry> {
        if !self.exists() {
            let registry = ExecutableRegistry::for_build_dir(Path::new(DEFAULT_BUILD_DIR))?;
            self.save_registry(&registry)?;
            info!(
                "Wrote default executable registry to {}",
                self.registry_path.display()
            );
        }
        self.load_registry()
    }

    /// Delete the registry file.
    ///
    /// Returns Ok(true) if the file was deleted, Ok(false) if it didn't exist.
    pub fn delete_registry(&self) -> std::io::Result<bool> {
        if !self.exists() {
            return Ok(false);
        }

        std::fs::remove_file(&self.registry_path)?;
        Ok(true)
    }
}

impl ExecutableResolver for ConfigStorage {
    fn resolve(&self, executable: Executable) -> Result<PathBuf, LookupError> {
        let registry = self.read_or_init().map_err(|source| LookupError::Registry {
            path: self.registry_path.clone(),
            source,
        })?;
        registry.resolve(executable)
    }
}
