//! `tessera select`: Pick the smallest compiled circuit for a requirements file.

use std::path::PathBuf;

use clap::Args;

use tessera_core::ToolConfig;
use tessera_gpc::{CatalogStore, CircuitCatalog, CircuitSelection, RequirementVector};

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Requirements JSON file, as printed by `tessera check`.
    #[arg(short, long)]
    pub requirements: PathBuf,

    /// Override the artifacts directory.
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,
}

/// Built-in circuits plus any recorded in the catalog file.
pub fn load_catalog(config: &ToolConfig) -> anyhow::Result<CircuitCatalog> {
    let mut catalog = CircuitCatalog::builtin();
    catalog.extend(CatalogStore::new(&config.circuits.catalog_path).load()?);
    Ok(catalog)
}

pub fn run(args: &SelectArgs, config: &ToolConfig) -> anyhow::Result<()> {
    let req = RequirementVector::load(&args.requirements)?;
    let artifacts_dir = args
        .artifacts_dir
        .clone()
        .unwrap_or_else(|| config.circuits.artifacts_dir.clone());

    let catalog = load_catalog(config)?;
    match catalog.find_circuit(&req, &artifacts_dir) {
        CircuitSelection::Found(circuit) => {
            let artifacts = circuit.artifacts(&artifacts_dir);
            println!("Circuit:          {}", circuit.circuit_id);
            println!("  Program:        {}", artifacts.wasm.display());
            println!("  Proving key:    {}", artifacts.proving_key.display());
            println!("  Verifying key:  {}", artifacts.verification_key.display());
        }
        CircuitSelection::CompileNeeded => {
            println!("No compiled circuit fits; compile one for:");
            println!("{}", req.to_json()?);
        }
    }
    Ok(())
}
