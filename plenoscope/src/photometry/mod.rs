//! Spectral curves and their alignment for the propagation config

pub mod library;
pub mod resample;
pub mod spectral_curve;

pub use library::{
    SpectrumLibrary, DEFAULT_NIGHT_SKY_BACKGROUND_KEY, DEFAULT_PHOTO_ELECTRIC_CONVERTER_KEY,
};
pub use resample::{align, AlignError, AlignedSpectra, DomainMismatchError};
pub use spectral_curve::{SpectralCurve, SpectralRole, ValidationError};
