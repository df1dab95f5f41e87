//! Inspect and initialise the executable registry.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use shared::config_storage::ConfigStorage;
use shared::executables::{Executable, ExecutableRegistry, ExecutableResolver};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage the merlict executable registry", long_about = None)]
struct Args {
    #[arg(long, help = "Registry file (defaults to ~/.merlict_develompment_kit_python.json)")]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Point every executable at a build directory, overwriting the registry
    Init {
        #[arg(default_value = "build")]
        build_dir: PathBuf,
    },
    /// Print the registry, creating it first if missing
    Show,
    /// Print the path of one executable
    Resolve { name: String },
    /// Delete the registry; the next lookup writes a fresh default one
    Reset,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let storage = match args.registry {
        Some(path) => ConfigStorage::with_path(path),
        None => ConfigStorage::new().context("Cannot locate the home directory")?,
    };

    match args.command {
        Command::Init { build_dir } => {
            let registry = ExecutableRegistry::for_build_dir(&build_dir)
                .with_context(|| format!("Invalid build directory {}", build_dir.display()))?;
            storage
                .save_registry(&registry)
                .with_context(|| format!("Failed to write {}", storage.registry_path().display()))?;
            info!(
                "Registered {} executables in {}",
                registry.len(),
                storage.registry_path().display()
            );
        }
        Command::Show => {
            let registry = storage
                .read_or_init()
                .with_context(|| format!("Failed to read {}", storage.registry_path().display()))?;
            for (name, path) in registry.iter() {
                let marker = if path.exists() { "" } else { "  (missing)" };
                println!("{name:45} {}{marker}", path.display());
            }
        }
        Command::Resolve { name } => {
            let executable = Executable::from_name(&name)
                .with_context(|| format!("Unknown executable '{name}'"))?;
            println!("{}", storage.resolve(executable)?.display());
        }
        Command::Reset => {
            let deleted = storage
                .delete_registry()
                .with_context(|| format!("Failed to delete {}", storage.registry_path().display()))?;
            if deleted {
                info!("Deleted {}", storage.registry_path().display());
            } else {
                info!("No registry at {}", storage.registry_path().display());
            }
        }
    }
    Ok(())
}
