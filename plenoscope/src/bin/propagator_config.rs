//! Write a propagator configuration built from two spectra.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use plenoscope::photometry::{
    SpectralCurve, SpectrumLibrary, DEFAULT_NIGHT_SKY_BACKGROUND_KEY,
    DEFAULT_PHOTO_ELECTRIC_CONVERTER_KEY,
};
use plenoscope::PropagatorConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build a propagator configuration", long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        help = "Where to write the configuration JSON",
        required_unless_present = "list"
    )]
    output: Option<PathBuf>,

    #[arg(long, help = "List the spectra in the library and exit")]
    list: bool,

    #[arg(long, help = "Directory of the spectrum library", default_value = "resources")]
    library: PathBuf,

    #[arg(long, help = "Night-sky-background key in the library", default_value = DEFAULT_NIGHT_SKY_BACKGROUND_KEY)]
    night_sky_background: String,

    #[arg(long, help = "Photo-electric-converter key in the library", default_value = DEFAULT_PHOTO_ELECTRIC_CONVERTER_KEY)]
    photo_electric_converter: String,

    #[arg(long, help = "Night-sky-background curve file, overrides the library key")]
    night_sky_background_file: Option<PathBuf>,

    #[arg(long, help = "Photo-electric-converter curve file, overrides the library key")]
    photo_electric_converter_file: Option<PathBuf>,
}

fn load(library: &SpectrumLibrary, file: Option<&PathBuf>, key: &str) -> Result<SpectralCurve> {
    match file {
        Some(path) => SpectralCurve::load_from_file(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => library
            .load(key)
            .with_context(|| format!("Failed to read '{key}' from {}", library.root_path().display())),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let library = SpectrumLibrary::with_path(args.library.clone());
    if args.list {
        let keys = library
            .keys()
            .with_context(|| format!("Failed to list {}", library.root_path().display()))?;
        for key in keys {
            println!("{key}");
        }
        return Ok(());
    }
    let Some(output) = args.output else {
        bail!("--output is required");
    };

    let nsb = load(
        &library,
        args.night_sky_background_file.as_ref(),
        &args.night_sky_background,
    )?;
    let pec = load(
        &library,
        args.photo_electric_converter_file.as_ref(),
        &args.photo_electric_converter,
    )?;

    let config = PropagatorConfig::build(&nsb, &pec).context("Spectra cannot be aligned")?;
    config
        .save_to_file(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Wrote propagator configuration ({} background samples, {} efficiency samples) to {}",
        config.night_sky_background.flux_vs_wavelength.len(),
        config.photo_electric_converter.quantum_efficiency_vs_wavelength.len(),
        output.display()
    );
    Ok(())
}
