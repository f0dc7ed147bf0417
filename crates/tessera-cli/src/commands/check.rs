//! `tessera check`: Validate a proof configuration against inputs and
//! print the circuit requirements they need.

use std::path::PathBuf;

use clap::Args;

use tessera_gpc::{check_config, check_proof_args, compile_revealed_claims, ProofConfig, ProofInputs};

use super::emit_json;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Proof configuration JSON file.
    #[arg(long = "config-file", short = 'p')]
    pub proof_config: PathBuf,

    /// Proof inputs JSON file. Without it only the configuration is checked.
    #[arg(short, long)]
    pub inputs: Option<PathBuf>,

    /// Print the revealed claims instead of the requirements.
    #[arg(long, requires = "inputs")]
    pub revealed: bool,

    /// Write the output here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &CheckArgs) -> anyhow::Result<()> {
    let config = ProofConfig::load(&args.proof_config)?;

    let Some(inputs_path) = &args.inputs else {
        let req = check_config(&config)?;
        return emit_json(&req, args.out.as_deref());
    };

    let inputs = ProofInputs::load(inputs_path)?;
    for (name, pod) in &inputs.pods {
        if !pod.verify_signature() {
            anyhow::bail!("input POD {} has an invalid signature", name);
        }
    }

    let req = check_proof_args(&config, &inputs)?;
    if args.revealed {
        let claims = compile_revealed_claims(&config, &inputs)?;
        emit_json(&claims, args.out.as_deref())
    } else {
        emit_json(&req, args.out.as_deref())
    }
}
