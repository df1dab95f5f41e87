//! Configuration of the plenoscope propagation executables.
//!
//! The config tells the propagation how much night-sky background to add,
//! how efficiently the photosensors detect photons, and how the photon
//! stream is sampled in time. It is written as JSON and handed to the
//! executable via its `-c` argument:
//!
//! ```text
//! {
//!   "night_sky_background_ligth": {"flux_vs_wavelength": [[w, f], ...], "exposure_time": 5e-8, "comment": "..."},
//!   "photo_electric_converter": {"quantum_efficiency_vs_wavelength": [[w, q], ...], "dark_rate": 1e-3,
//!                                "probability_for_second_puls": 0.0, "comment": "..."},
//!   "photon_stream": {"time_slice_duration": 5e-10, "single_photon_arrival_time_resolution": 4.16e-10}
//! }
//! ```
//!
//! The key `night_sky_background_ligth` is spelled the way the executables
//! read it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::photometry::{align, AlignError, SpectralCurve, SpectrumLibrary};

/// Calibration constants of the simulated instrument.
///
/// These are not derived from the spectra; the defaults describe the
/// Cherenkov plenoscope's photosensors and readout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagatorConstants {
    /// Exposure time for the night-sky background in seconds
    pub exposure_time: f64,
    /// Dark count rate of the photo-electric converter
    pub dark_rate: f64,
    /// Probability for an afterpulse
    pub probability_for_second_puls: f64,
    /// Duration of one time slice of the photon stream in seconds
    pub time_slice_duration: f64,
    /// Single-photon arrival-time resolution in seconds
    pub single_photon_arrival_time_resolution: f64,
}

impl Default for PropagatorConstants {
    fn default() -> Self {
        Self {
            exposure_time: 50e-9,
            dark_rate: 1e-3,
            probability_for_second_puls: 0.0,
            time_slice_duration: 0.5e-9,
            single_photon_arrival_time_resolution: 0.416e-9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightSkyBackgroundLight {
    /// `[wavelength / m, flux / m^-2 sr^-1 s^-1 m^-1]` rows
    pub flux_vs_wavelength: Vec<[f64; 2]>,
    pub exposure_time: f64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoElectricConverter {
    /// `[wavelength / m, efficiency]` rows
    pub quantum_efficiency_vs_wavelength: Vec<[f64; 2]>,
    pub dark_rate: f64,
    pub probability_for_second_puls: f64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotonStream {
    pub time_slice_duration: f64,
    pub single_photon_arrival_time_resolution: f64,
}

/// Full config of the propagation executables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagatorConfig {
    #[serde(rename = "night_sky_background_ligth")]
    pub night_sky_background: NightSkyBackgroundLight,
    pub photo_electric_converter: PhotoElectricConverter,
    pub photon_stream: PhotonStream,
}

impl PropagatorConfig {
    /// Build the config from the two spectra with the default constants.
    ///
    /// The spectra are aligned first; validation and domain errors are
    /// returned unchanged.
    pub fn build(
        night_sky_background: &SpectralCurve,
        photo_electric_converter: &SpectralCurve,
    ) -> std::result::Result<Self, AlignError> {
        Self::build_with_constants(
            night_sky_background,
            photo_electric_converter,
            &PropagatorConstants::default(),
        )
    }

    /// Build the config from the two spectra with explicit constants.
    pub fn build_with_constants(
        night_sky_background: &SpectralCurve,
        photo_electric_converter: &SpectralCurve,
        constants: &PropagatorConstants,
    ) -> std::result::Result<Self, AlignError> {
        let aligned = align(night_sky_background, photo_electric_converter)?;
        let nsb = &aligned.night_sky_background;
        let pec = &aligned.photo_electric_converter;

        Ok(Self {
            night_sky_background: NightSkyBackgroundLight {
                flux_vs_wavelength: nsb.columns(),
                exposure_time: constants.exposure_time,
                comment: nsb.comment(),
            },
            photo_electric_converter: PhotoElectricConverter {
                quantum_efficiency_vs_wavelength: pec.columns(),
                dark_rate: constants.dark_rate,
                probability_for_second_puls: constants.probability_for_second_puls,
                comment: pec.comment(),
            },
            photon_stream: PhotonStream {
                time_slice_duration: constants.time_slice_duration,
                single_photon_arrival_time_resolution: constants
                    .single_photon_arrival_time_resolution,
            },
        })
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> std::result::Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Build the config from two curves stored in a [`SpectrumLibrary`].
pub fn make_config_from_keys(
    library: &SpectrumLibrary,
    night_sky_background_key: &str,
    photo_electric_converter_key: &str,
) -> Result<PropagatorConfig> {
    let nsb = library.load(night_sky_background_key)?;
    let pec = library.load(photo_electric_converter_key)?;
    Ok(PropagatorConfig::build(&nsb, &pec)?)
}
