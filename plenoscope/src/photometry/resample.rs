//! Alignment of the night-sky background onto the photo-detector domain.
//!
//! The propagation draws night-sky photons from the background spectrum and
//! then asks the photo-electric converter whether each photon is detected.
//! Every background wavelength must therefore lie inside the detector curve.
//! [`align`] validates both curves and reconciles their domains:
//!
//! 1. **Upper bound**: the detector's last wavelength must stay the binding
//!    upper bound. A background curve reaching up to it (or less than
//!    [`UPPER_BOUND_TOLERANCE`] beyond it) has its last sample moved to
//!    [`UPPER_BOUND_MARGIN`] below the detector's maximum.
//! 2. **Lower bound**: when the background starts above the detector, the
//!    detector curve is cut at the background's first wavelength, with a
//!    linearly interpolated sample at the cut.
//!
//! The upper bound is reconciled before the lower bound. Inputs are never
//! modified; aligned copies are returned.

use super::spectral_curve::{SpectralCurve, SpectralRole, ValidationError};
use log::debug;
use thiserror::Error;

/// Largest overshoot (in meters) of the background beyond the detector's
/// maximum wavelength that is still reconciled
pub const UPPER_BOUND_TOLERANCE: f64 = 0.5e-9;

/// Distance (in meters) below the detector's maximum at which the background
/// curve ends after reconciliation
pub const UPPER_BOUND_MARGIN: f64 = 1e-9;

/// Spectral domains that cannot be reconciled within tolerance.
#[derive(Debug, Error, PartialEq)]
pub enum DomainMismatchError {
    #[error("night-sky-background ends at {nsb_max:e} m, {excess:e} m beyond the photo-electric-converter maximum {pec_max:e} m (tolerance {tolerance:e} m)")]
    UpperBoundExceeded {
        nsb_max: f64,
        pec_max: f64,
        excess: f64,
        tolerance: f64,
    },

    #[error("moving the last night-sky-background wavelength to {moved_to:e} m would not stay above the previous sample at {previous:e} m")]
    UpperBoundBreaksOrdering { moved_to: f64, previous: f64 },

    #[error("night-sky-background starts at {nsb_min:e} m, below the photo-electric-converter minimum {pec_min:e} m")]
    LowerBoundUncovered { nsb_min: f64, pec_min: f64 },

    #[error("cannot cut curve '{key}' at {min_wavelength:e} m, outside its sampled range")]
    CutOutsideDomain { key: String, min_wavelength: f64 },
}

/// Errors of [`align`].
#[derive(Debug, Error, PartialEq)]
pub enum AlignError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    DomainMismatch(#[from] DomainMismatchError),
}

/// The two curves after alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSpectra {
    pub night_sky_background: SpectralCurve,
    pub photo_electric_converter: SpectralCurve,
}

/// Validate both curves and reconcile their wavelength domains.
///
/// On success both returned curves are strictly ascending and the
/// photo-electric converter's domain contains the night-sky background's.
pub fn align(
    night_sky_background: &SpectralCurve,
    photo_electric_converter: &SpectralCurve,
) -> Result<AlignedSpectra, AlignError> {
    night_sky_background.validate(SpectralRole::NightSkyBackground)?;
    photo_electric_converter.validate(SpectralRole::PhotoElectricConverter)?;

    let mut nsb = night_sky_background.clone();
    let mut pec = photo_electric_converter.clone();

    // Both curves hold at least two samples after validation
    let pec_max = pec.wavelength[pec.len() - 1];
    limit_max_wavelength(&mut nsb, pec_max)?;

    let nsb_min = nsb.wavelength[0];
    let pec_min = pec.wavelength[0];
    if nsb_min > pec_min {
        pec = limit_min_wavelength(&pec, nsb_min)?;
    } else if nsb_min < pec_min {
        return Err(DomainMismatchError::LowerBoundUncovered { nsb_min, pec_min }.into());
    }

    Ok(AlignedSpectra {
        night_sky_background: nsb,
        photo_electric_converter: pec,
    })
}

fn limit_max_wavelength(nsb: &mut SpectralCurve, pec_max: f64) -> Result<(), DomainMismatchError> {
    let last = nsb.len() - 1;
    let nsb_max = nsb.wavelength[last];
    if nsb_max < pec_max {
        return Ok(());
    }

    let excess = nsb_max - pec_max;
    if excess >= UPPER_BOUND_TOLERANCE {
        return Err(DomainMismatchError::UpperBoundExceeded {
            nsb_max,
            pec_max,
            excess,
            tolerance: UPPER_BOUND_TOLERANCE,
        });
    }

    let moved_to = pec_max - UPPER_BOUND_MARGIN;
    let previous = nsb.wavelength[last - 1];
    if moved_to <= previous {
        return Err(DomainMismatchError::UpperBoundBreaksOrdering { moved_to, previous });
    }

    debug!(
        "Moving last night-sky-background wavelength from {nsb_max:e} m to {moved_to:e} m"
    );
    nsb.wavelength[last] = moved_to;
    Ok(())
}

/// Cut `curve` at `min_wavelength`.
///
/// The result starts with an interpolated sample at `min_wavelength`,
/// followed by every sample strictly above it. The cut must lie strictly
/// inside the curve's sampled range.
pub fn limit_min_wavelength(
    curve: &SpectralCurve,
    min_wavelength: f64,
) -> Result<SpectralCurve, DomainMismatchError> {
    let outside = || DomainMismatchError::CutOutsideDomain {
        key: curve.key.clone(),
        min_wavelength,
    };
    let (Some(first), Some(last)) = (curve.min_wavelength(), curve.max_wavelength()) else {
        return Err(outside());
    };
    if min_wavelength <= first || min_wavelength >= last {
        return Err(outside());
    }
    let value_at_min = curve.interpolate(min_wavelength).ok_or_else(outside)?;

    let kept = curve.wavelength.iter().filter(|&&w| w > min_wavelength).count();
    let mut wavelength = Vec::with_capacity(kept + 1);
    let mut value = Vec::with_capacity(kept + 1);
    wavelength.push(min_wavelength);
    value.push(value_at_min);

    for (&w, &v) in curve.wavelength.iter().zip(&curve.value) {
        if w > min_wavelength {
            wavelength.push(w);
            value.push(v);
        }
    }

    debug!(
        "Cut {} at {min_wavelength:e} m, kept {kept} of {} samples",
        curve.key,
        curve.len()
    );

    Ok(SpectralCurve {
        wavelength,
        value,
        ..curve.clone()
    })
}
