//! Wavelength-indexed spectral curves for the plenoscope propagation.
//!
//! Two kinds of curves feed the propagation config:
//!
//! - **Night-sky background**: photon flux of the ambient sky, in
//!   m⁻² sr⁻¹ s⁻¹ m⁻¹. Values may be tiny but never zero.
//! - **Photo-electric converter**: probability that a photon of a given
//!   wavelength is detected, dimensionless in [0, 1].
//!
//! Wavelengths are in meters, matching the units the merlict executables
//! expect. Curves are stored as JSON documents with the fields
//! `wavelength`, `value`, `units`, `key` and `reference`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Unit of every wavelength axis
pub const WAVELENGTH_UNIT: &str = "m";

/// Unit of night-sky-background flux values
pub const NIGHT_SKY_BACKGROUND_UNIT: &str = "m^{-2} sr^{-1} s^{-1} m^{-1}";

/// Unit of photo-electric conversion efficiency values
pub const EFFICIENCY_UNIT: &str = "1";

/// The role a curve plays in the propagation config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralRole {
    NightSkyBackground,
    PhotoElectricConverter,
}

impl SpectralRole {
    /// `(wavelength unit, value unit)` a curve in this role must carry
    pub fn expected_units(&self) -> (&'static str, &'static str) {
        match self {
            SpectralRole::NightSkyBackground => (WAVELENGTH_UNIT, NIGHT_SKY_BACKGROUND_UNIT),
            SpectralRole::PhotoElectricConverter => (WAVELENGTH_UNIT, EFFICIENCY_UNIT),
        }
    }
}

impl fmt::Display for SpectralRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpectralRole::NightSkyBackground => f.write_str("night-sky-background"),
            SpectralRole::PhotoElectricConverter => f.write_str("photo-electric-converter"),
        }
    }
}

/// Malformed or out-of-contract spectral input.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{role} curve has {wavelengths} wavelengths but {values} values")]
    LengthMismatch {
        role: SpectralRole,
        wavelengths: usize,
        values: usize,
    },

    #[error("{role} curve needs at least two samples, got {samples}")]
    TooFewSamples { role: SpectralRole, samples: usize },

    #[error("{role} curve has units ({found_wavelength}, {found_value}), expected ({expected_wavelength}, {expected_value})")]
    UnexpectedUnits {
        role: SpectralRole,
        found_wavelength: String,
        found_value: String,
        expected_wavelength: &'static str,
        expected_value: &'static str,
    },

    #[error("night-sky-background flux must be strictly positive, got {value} at index {index}")]
    NonPositiveFlux { index: usize, value: f64 },

    #[error("photo-electric efficiency must not exceed 1.0, got {value} at index {index}")]
    EfficiencyAboveOne { index: usize, value: f64 },

    #[error("{role} wavelengths must be strictly increasing, violated at index {index}")]
    NotAscending { role: SpectralRole, index: usize },
}

/// A physically sampled curve: values over an ascending wavelength axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralCurve {
    /// Wavelengths in meters
    pub wavelength: Vec<f64>,

    /// Value at each wavelength, in `units.1`
    pub value: Vec<f64>,

    /// `(wavelength unit, value unit)`
    pub units: (String, String),

    /// Short identifier of the data set, e.g. `nsb_la_palma_2013_benn`
    pub key: String,

    /// Where the data was taken from
    pub reference: String,
}

impl SpectralCurve {
    /// Night-sky-background curve with the matching unit tags
    pub fn night_sky_background(
        wavelength: Vec<f64>,
        value: Vec<f64>,
        key: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self::with_role_units(
            SpectralRole::NightSkyBackground,
            wavelength,
            value,
            key.into(),
            reference.into(),
        )
    }

    /// Photo-electric-converter curve with the matching unit tags
    pub fn photo_electric_converter(
        wavelength: Vec<f64>,
        value: Vec<f64>,
        key: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self::with_role_units(
            SpectralRole::PhotoElectricConverter,
            wavelength,
            value,
            key.into(),
            reference.into(),
        )
    }

    fn with_role_units(
        role: SpectralRole,
        wavelength: Vec<f64>,
        value: Vec<f64>,
        key: String,
        reference: String,
    ) -> Self {
        let (wavelength_unit, value_unit) = role.expected_units();
        Self {
            wavelength,
            value,
            units: (wavelength_unit.to_string(), value_unit.to_string()),
            key,
            reference,
        }
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    pub fn min_wavelength(&self) -> Option<f64> {
        self.wavelength.first().copied()
    }

    pub fn max_wavelength(&self) -> Option<f64> {
        self.wavelength.last().copied()
    }

    /// Provenance string, `"{key},{reference}"`
    pub fn comment(&self) -> String {
        format!("{},{}", self.key, self.reference)
    }

    /// `[wavelength, value]` rows
    pub fn columns(&self) -> Vec<[f64; 2]> {
        self.wavelength
            .iter()
            .zip(&self.value)
            .map(|(&w, &v)| [w, v])
            .collect()
    }

    /// Check every invariant a curve in `role` must satisfy.
    ///
    /// Checks run in a fixed order (lengths, units, values, ordering) and the
    /// first violation is reported.
    pub fn validate(&self, role: SpectralRole) -> Result<(), ValidationError> {
        if self.wavelength.len() != self.value.len() {
            return Err(ValidationError::LengthMismatch {
                role,
                wavelengths: self.wavelength.len(),
                values: self.value.len(),
            });
        }

        if self.wavelength.len() < 2 {
            return Err(ValidationError::TooFewSamples {
                role,
                samples: self.wavelength.len(),
            });
        }

        let (expected_wavelength, expected_value) = role.expected_units();
        if self.units.0 != expected_wavelength || self.units.1 != expected_value {
            return Err(ValidationError::UnexpectedUnits {
                role,
                found_wavelength: self.units.0.clone(),
                found_value: self.units.1.clone(),
                expected_wavelength,
                expected_value,
            });
        }

        match role {
            SpectralRole::NightSkyBackground => {
                if let Some(index) = self.value.iter().position(|&v| v <= 0.0 || v.is_nan()) {
                    return Err(ValidationError::NonPositiveFlux {
                        index,
                        value: self.value[index],
                    });
                }
            }
            SpectralRole::PhotoElectricConverter => {
                if let Some(index) = self.value.iter().position(|&v| v > 1.0 || v.is_nan()) {
                    return Err(ValidationError::EfficiencyAboveOne {
                        index,
                        value: self.value[index],
                    });
                }
            }
        }

        for i in 1..self.wavelength.len() {
            let step = self.wavelength[i] - self.wavelength[i - 1];
            if step <= 0.0 || step.is_nan() {
                return Err(ValidationError::NotAscending { role, index: i });
            }
        }

        Ok(())
    }

    /// Linearly interpolate the value at `wavelength`.
    ///
    /// `None` when `wavelength` lies outside the sampled range or the curve
    /// has no samples. Assumes an ascending curve.
    pub fn interpolate(&self, wavelength: f64) -> Option<f64> {
        if self.value.len() != self.wavelength.len() {
            return None;
        }
        let first = *self.wavelength.first()?;
        let last = self.wavelength.len() - 1;
        if !(first..=self.wavelength[last]).contains(&wavelength) {
            return None;
        }
        if wavelength == self.wavelength[last] {
            return Some(self.value[last]);
        }

        // First sample strictly above `wavelength`; always in 1..=last here
        let upper = self.wavelength.partition_point(|&w| w <= wavelength);
        let lower = upper - 1;

        let t = (wavelength - self.wavelength[lower])
            / (self.wavelength[upper] - self.wavelength[lower]);
        Some(self.value[lower] * (1.0 - t) + self.value[upper] * t)
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn nsb(wavelength: Vec<f64>, value: Vec<f64>) -> SpectralCurve {
        SpectralCurve::night_sky_background(wavelength, value, "nsb", "test")
    }

    fn pec(wavelength: Vec<f64>, value: Vec<f64>) -> SpectralCurve {
        SpectralCurve::photo_electric_converter(wavelength, value, "pec", "test")
    }

    #[test]
    fn test_valid_curves() {
        let night = nsb(vec![250e-9, 400e-9, 700e-9], vec![1e-3, 2.0, 5.0]);
        assert!(night.validate(SpectralRole::NightSkyBackground).is_ok());

        let detector = pec(vec![200e-9, 400e-9, 800e-9], vec![0.0, 0.3, 1.0]);
        assert!(detector.validate(SpectralRole::PhotoElectricConverter).is_ok());
    }

    #[test]
    fn test_length_mismatch() {
        let curve = nsb(vec![250e-9, 400e-9], vec![1.0]);
        assert_eq!(
            curve.validate(SpectralRole::NightSkyBackground),
            Err(ValidationError::LengthMismatch {
                role: SpectralRole::NightSkyBackground,
                wavelengths: 2,
                values: 1,
            })
        );
    }

    #[test]
    fn test_too_few_samples() {
        let curve = pec(vec![250e-9], vec![0.5]);
        assert!(matches!(
            curve.validate(SpectralRole::PhotoElectricConverter),
            Err(ValidationError::TooFewSamples { samples: 1, .. })
        ));
    }

    #[test]
    fn test_wrong_role_units() {
        // A detector curve handed in where the sky flux is expected
        let curve = pec(vec![250e-9, 400e-9], vec![0.2, 0.4]);
        let err = curve
            .validate(SpectralRole::NightSkyBackground)
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnexpectedUnits { .. }));
        assert!(err.to_string().contains("m^{-2} sr^{-1} s^{-1} m^{-1}"));
    }

    #[test]
    fn test_zero_flux_rejected() {
        let curve = nsb(vec![250e-9, 400e-9], vec![0.0, 1.0]);
        assert_eq!(
            curve.validate(SpectralRole::NightSkyBackground),
            Err(ValidationError::NonPositiveFlux {
                index: 0,
                value: 0.0
            })
        );
    }

    #[test]
    fn test_negative_and_nan_flux_rejected() {
        let negative = nsb(vec![250e-9, 400e-9], vec![1.0, -1e-12]);
        assert!(matches!(
            negative.validate(SpectralRole::NightSkyBackground),
            Err(ValidationError::NonPositiveFlux { index: 1, .. })
        ));

        let nan = nsb(vec![250e-9, 400e-9], vec![f64::NAN, 1.0]);
        assert!(matches!(
            nan.validate(SpectralRole::NightSkyBackground),
            Err(ValidationError::NonPositiveFlux { index: 0, .. })
        ));
    }

    #[test]
    fn test_efficiency_above_one_rejected() {
        let curve = pec(vec![250e-9, 400e-9], vec![0.5, 1.2]);
        assert_eq!(
            curve.validate(SpectralRole::PhotoElectricConverter),
            Err(ValidationError::EfficiencyAboveOne {
                index: 1,
                value: 1.2
            })
        );
    }

    #[test]
    fn test_not_ascending() {
        let repeated = nsb(vec![250e-9, 300e-9, 300e-9], vec![1.0, 1.0, 1.0]);
        assert_eq!(
            repeated.validate(SpectralRole::NightSkyBackground),
            Err(ValidationError::NotAscending {
                role: SpectralRole::NightSkyBackground,
                index: 2
            })
        );

        let reversed = pec(vec![400e-9, 300e-9], vec![0.1, 0.1]);
        assert!(matches!(
            reversed.validate(SpectralRole::PhotoElectricConverter),
            Err(ValidationError::NotAscending { index: 1, .. })
        ));
    }

    #[test]
    fn test_interpolate() {
        let curve = pec(vec![200e-9, 250e-9, 300e-9], vec![0.1, 0.2, 0.3]);

        assert_relative_eq!(curve.interpolate(200e-9).unwrap(), 0.1);
        assert_relative_eq!(curve.interpolate(250e-9).unwrap(), 0.2);
        assert_relative_eq!(curve.interpolate(260e-9).unwrap(), 0.22, epsilon = 1e-12);
        assert_relative_eq!(curve.interpolate(225e-9).unwrap(), 0.15, epsilon = 1e-12);
        assert_relative_eq!(curve.interpolate(300e-9).unwrap(), 0.3);
    }

    #[test]
    fn test_interpolate_outside_range_is_none() {
        let curve = pec(vec![200e-9, 250e-9, 300e-9], vec![0.1, 0.2, 0.3]);
        assert_eq!(curve.interpolate(100e-9), None);
        assert_eq!(curve.interpolate(900e-9), None);
        assert_eq!(curve.interpolate(f64::NAN), None);
    }

    #[test]
    fn test_interpolate_empty_or_ragged_is_none() {
        let empty = pec(vec![], vec![]);
        assert_eq!(empty.interpolate(250e-9), None);

        let ragged = pec(vec![200e-9, 300e-9], vec![0.1]);
        assert_eq!(ragged.interpolate(250e-9), None);
    }

    #[test]
    fn test_comment_and_columns() {
        let curve = SpectralCurve::photo_electric_converter(
            vec![300e-9, 400e-9],
            vec![0.2, 0.3],
            "hamamatsu_r11920_100_05",
            "Hamamatsu datasheet",
        );
        assert_eq!(curve.comment(), "hamamatsu_r11920_100_05,Hamamatsu datasheet");
        assert_eq!(curve.columns(), vec![[300e-9, 0.2], [400e-9, 0.3]]);
        assert_eq!(curve.min_wavelength(), Some(300e-9));
        assert_eq!(curve.max_wavelength(), Some(400e-9));
    }

    #[test]
    fn test_json_document_layout() {
        let json = r#"{
            "wavelength": [2.5e-7, 7.0e-7],
            "value": [1.0e10, 2.0e10],
            "units": ["m", "m^{-2} sr^{-1} s^{-1} m^{-1}"],
            "key": "nsb_la_palma_2013_benn",
            "reference": "Gaug 2013"
        }"#;
        let curve: SpectralCurve = serde_json::from_str(json).unwrap();
        assert!(curve.validate(SpectralRole::NightSkyBackground).is_ok());
        assert_eq!(curve.key, "nsb_la_palma_2013_benn");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("curve.json");
        let curve = nsb(vec![250e-9, 400e-9], vec![1.0, 2.0]);

        curve.save_to_file(&path).unwrap();
        let loaded = SpectralCurve::load_from_file(&path).unwrap();
        assert_eq!(loaded, curve);
    }
}
