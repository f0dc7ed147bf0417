//! `tessera verify`: Check a POD's signature against its embedded key.

use std::path::PathBuf;

use clap::Args;

use tessera_pod::{Pod, SerializedPod};

use super::read_json;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// POD JSON file.
    #[arg(short, long)]
    pub pod: PathBuf,
}

pub fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let serialized: SerializedPod = read_json(&args.pod)?;
    let pod = Pod::from_serialized(serialized)?;

    println!("Content ID:  {}", pod.content_id());
    println!("Entries:     {}", pod.entries().len());
    println!("Signer:      {}", pod.serialize().signer_public_key);

    if pod.verify_signature() {
        println!("Signature:   valid");
        Ok(())
    } else {
        anyhow::bail!("signature is not valid for {}", args.pod.display())
    }
}
