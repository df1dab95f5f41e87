//! Print the light-field-sensor record of a scenery.

use anyhow::{Context, Result};
use clap::Parser;
use plenoscope::scenery::read_plenoscope_geometry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract the light-field sensor from a scenery", long_about = None)]
struct Args {
    #[arg(help = "Scenery JSON file")]
    scenery: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let sensor = read_plenoscope_geometry(&args.scenery)
        .with_context(|| format!("No light-field sensor in {}", args.scenery.display()))?;
    println!("{}", serde_json::to_string_pretty(&sensor)?);
    Ok(())
}
