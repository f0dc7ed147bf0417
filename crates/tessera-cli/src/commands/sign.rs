//! `tessera sign`: Sign a JSON map of typed entries into a POD.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use zeroize::Zeroize;

use tessera_core::PodEntries;
use tessera_crypto::KeyPair;
use tessera_pod::Pod;

use super::{emit_json, read_json};

#[derive(Args, Debug)]
pub struct SignArgs {
    /// JSON file of entries (`name -> {"type", "value"}`).
    #[arg(short, long)]
    pub entries: PathBuf,

    /// File holding the private key (hex or base64).
    #[arg(short, long)]
    pub key: PathBuf,

    /// Write the POD here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &SignArgs) -> anyhow::Result<()> {
    let entries: PodEntries = read_json(&args.entries)?;

    let mut encoded = std::fs::read_to_string(&args.key)
        .with_context(|| format!("failed to read {}", args.key.display()))?;
    let keypair = KeyPair::from_encoded(&encoded);
    encoded.zeroize();
    let keypair = keypair.context("invalid private key")?;

    let pod = Pod::sign(entries, &keypair)?;
    emit_json(&pod.serialize(), args.out.as_deref())
}
