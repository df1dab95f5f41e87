//! Keyed collection of spectral curves on disk.
//!
//! A library is a directory of `<key>.json` files, each holding one
//! [`SpectralCurve`]. The propagation config is usually built from the
//! La Palma night-sky background and the Hamamatsu R11920-100-05 photosensor.

use super::spectral_curve::SpectralCurve;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Night-sky background measured at La Palma (Benn 2013)
pub const DEFAULT_NIGHT_SKY_BACKGROUND_KEY: &str = "nsb_la_palma_2013_benn";

/// Quantum efficiency of the Hamamatsu R11920-100-05 photomultiplier
pub const DEFAULT_PHOTO_ELECTRIC_CONVERTER_KEY: &str = "hamamatsu_r11920_100_05";

/// Directory of spectral curves addressed by key.
#[derive(Debug, Clone)]
pub struct SpectrumLibrary {
    root_path: PathBuf,
}

impl SpectrumLibrary {
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// File holding the curve for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root_path.join(format!("{key}.json"))
    }

    /// Load the curve stored under `key`.
    pub fn load(&self, key: &str) -> std::io::Result<SpectralCurve> {
        let path = self.path_for(key);
        debug!("Loading spectrum '{key}' from {}", path.display());
        let curve = SpectralCurve::load_from_file(&path)?;
        if curve.key != key {
            warn!(
                "Spectrum file {} declares key '{}', expected '{key}'",
                path.display(),
                curve.key
            );
        }
        Ok(curve)
    }

    /// Store `curve` under its own key, creating the library directory if needed.
    pub fn save(&self, curve: &SpectralCurve) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root_path)?;
        let path = self.path_for(&curve.key);
        curve.save_to_file(&path)?;
        Ok(path)
    }

    /// Keys of all curves in the library, sorted.
    pub fn keys(&self) -> std::io::Result<Vec<String>> {
        if !self.root_path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root_path)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn curve(key: &str) -> SpectralCurve {
        SpectralCurve::photo_electric_converter(vec![300e-9, 400e-9], vec![0.1, 0.2], key, "ref")
    }

    #[test]
    fn test_save_and_load_by_key() {
        let dir = TempDir::new().unwrap();
        let library = SpectrumLibrary::with_path(dir.path().join("spectra"));

        let path = library.save(&curve("pmt_a")).unwrap();
        assert_eq!(path, library.path_for("pmt_a"));
        assert_eq!(library.load("pmt_a").unwrap(), curve("pmt_a"));
    }

    #[test]
    fn test_missing_key() {
        let dir = TempDir::new().unwrap();
        let library = SpectrumLibrary::with_path(dir.path().to_path_buf());
        let err = library.load("nope").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_keys_sorted() {
        let dir = TempDir::new().unwrap();
        let library = SpectrumLibrary::with_path(dir.path().to_path_buf());
        library.save(&curve("b_curve")).unwrap();
        library.save(&curve("a_curve")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(library.keys().unwrap(), vec!["a_curve", "b_curve"]);
    }

    #[test]
    fn test_keys_of_missing_directory() {
        let library = SpectrumLibrary::with_path(PathBuf::from("/nonexistent/spectra/dir"));
        assert!(library.keys().unwrap().is_empty());
    }
}
