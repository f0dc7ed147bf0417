//! `tessera catalog`: List or extend the circuit catalog.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use tessera_core::ToolConfig;
use tessera_gpc::{CatalogStore, CircuitCapacity, CircuitDescriptor, RequirementVector};

use super::select::load_catalog;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List known circuits and whether their artifacts are present.
    List,
    /// Record a compiled circuit's capacity in the catalog file.
    Add {
        /// Requirements JSON file describing the circuit's capacity.
        #[arg(short, long)]
        requirements: PathBuf,

        /// Circuit identifier. Defaults to one derived from the capacity.
        #[arg(long)]
        id: Option<String>,
    },
}

pub fn run(args: &CatalogArgs, config: &ToolConfig) -> anyhow::Result<()> {
    match &args.command {
        CatalogCommand::List => {
            let catalog = load_catalog(config)?;
            for circuit in catalog.circuits() {
                let present = circuit.artifacts(&config.circuits.artifacts_dir).all_present();
                println!(
                    "{:<48} {}",
                    circuit.circuit_id,
                    if present { "present" } else { "missing" }
                );
            }
            Ok(())
        }
        CatalogCommand::Add { requirements, id } => {
            let req = RequirementVector::load(requirements)?;
            let mut circuit = CircuitDescriptor::new(CircuitCapacity::from(&req));
            if let Some(id) = id {
                circuit.circuit_id = id.clone();
            }
            let store = CatalogStore::new(&config.circuits.catalog_path);
            store.append(circuit.clone())?;
            println!("Added {} to {}", circuit.circuit_id, store.path().display());
            Ok(())
        }
    }
}
