//! `tessera keygen`: Generate an Ed25519 signing key pair.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use zeroize::Zeroize;

use tessera_crypto::KeyPair;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write the hex private key to this file instead of printing it.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    let keypair = KeyPair::generate();
    let public_key = keypair.public_key().to_base64();
    let mut secret = hex::encode(keypair.secret_bytes());

    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", secret))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "private key written");
            println!("Public key: {}", public_key);
        }
        None => {
            println!("Private key: {}", secret);
            println!("Public key:  {}", public_key);
        }
    }

    secret.zeroize();
    Ok(())
}
