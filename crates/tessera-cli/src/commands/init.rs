//! `tessera init`: Write a default configuration file.

use std::path::Path;

use clap::Args;

use tessera_core::ToolConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let config = ToolConfig::default();
    config.save(config_path)?;
    tracing::info!(path = %config_path.display(), "wrote default config");

    println!("Configuration written to {}", config_path.display());
    println!("  Artifacts: {}", config.circuits.artifacts_dir.display());
    println!("  Catalog:   {}", config.circuits.catalog_path.display());
    Ok(())
}
