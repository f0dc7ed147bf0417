//! Tessera CLI: Sign and verify PODs, validate proof configurations,
//! and pick compiled circuits.
//!
//! Subcommands: init, keygen, sign, verify, check, select, catalog, commit.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tessera_core::ToolConfig;

/// Tessera: Signed records and proof-circuit sizing.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "tessera.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Generate a signing key pair.
    Keygen(commands::keygen::KeygenArgs),
    /// Sign a set of entries into a POD.
    Sign(commands::sign::SignArgs),
    /// Verify a POD's signature.
    Verify(commands::verify::VerifyArgs),
    /// Validate a proof configuration against inputs and print its requirements.
    Check(commands::check::CheckArgs),
    /// Select a compiled circuit for a requirements file.
    Select(commands::select::SelectArgs),
    /// Manage the circuit catalog.
    Catalog(commands::catalog::CatalogArgs),
    /// Build an external commitment over a set of entries.
    Commit(commands::commit::CommitArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ToolConfig::load(&cli.config)?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    if config.json_logs() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Sign(args) => commands::sign::run(args),
        Commands::Verify(args) => commands::verify::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Select(args) => commands::select::run(args, &config),
        Commands::Catalog(args) => commands::catalog::run(args, &config),
        Commands::Commit(args) => commands::commit::run(args),
    }
}
