//! `tessera commit`: Build the keccak external commitment over entries.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

use tessera_core::PodEntries;
use tessera_pod::{build_external_commitment, AbiType};

use super::{emit_json, read_json};

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// JSON file of entries, or a serialized POD.
    #[arg(short, long)]
    pub entries: PathBuf,

    /// JSON file mapping each entry name to its encoding (`uint64`, `string`, `bytes32[]`, ...).
    #[arg(short, long)]
    pub types: PathBuf,

    /// Write the tree dump here.
    #[arg(long)]
    pub dump: Option<PathBuf>,
}

pub fn run(args: &CommitArgs) -> anyhow::Result<()> {
    let document: serde_json::Value = read_json(&args.entries)?;
    let entries_json = match document.get("entries") {
        Some(entries) if document.get("signature").is_some() => entries.clone(),
        _ => document,
    };
    let entries: PodEntries = serde_json::from_value(entries_json)?;
    let types: BTreeMap<String, AbiType> = read_json(&args.types)?;

    let commitment = build_external_commitment(&entries, &types)?;
    println!("Root:    {}", commitment.root_hex());
    println!("Leaves:  {}", commitment.entry_names().join(", "));

    if let Some(path) = &args.dump {
        emit_json(&commitment.dump(), Some(path))?;
    }
    Ok(())
}
