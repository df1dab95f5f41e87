//! Light-field calibration and photon propagation for merlict plenoscopes.
//!
//! The heavy lifting is done by external merlict executables. This crate
//! prepares their inputs, fills in their argument contracts and reports
//! their exit codes:
//!
//! - [`photometry`] validates and aligns the night-sky-background and
//!   photo-electric-converter spectra.
//! - [`propagator_config`] turns an aligned pair of spectra into the
//!   configuration read by the propagation executables.
//! - [`light_field`] splits a light-field-geometry estimate into seeded
//!   blocks and reduces their results.
//! - [`propagation`] runs event-tape and raw-photon propagation.
//! - [`scenery`] reads the light-field sensor out of a scenery file.

pub mod error;
pub mod light_field;
pub mod photometry;
pub mod propagation;
pub mod propagator_config;
pub mod scenery;
pub mod shared_args;

pub use error::{Error, Result};
pub use light_field::{make_jobs, reduce, run_job, JobDescriptor, MapPlan};
pub use propagation::{propagate, propagate_raw_photons, EventTapePropagation, RawPhotonPropagation};
pub use propagator_config::{make_config_from_keys, PropagatorConfig, PropagatorConstants};
