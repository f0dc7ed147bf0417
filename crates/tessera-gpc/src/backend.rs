//! Seams to the external circuit compiler and proving system.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    ArtifactPaths, CatalogStore, CircuitCapacity, CircuitCatalog, CircuitDescriptor,
    CircuitSelection,
};
use crate::error::GpcError;
use crate::requirements::RequirementVector;

/// Compiles a circuit of a given capacity, writing its artifacts under
/// `artifacts_dir/<circuit id>/`.
pub trait CircuitCompiler {
    fn compile(&self, capacity: &CircuitCapacity, artifacts_dir: &Path) -> Result<CircuitDescriptor, GpcError>;
}

/// Produces and checks proofs with compiled artifacts.
pub trait ProvingBackend {
    fn prove(&self, artifacts: &ArtifactPaths, witness: &serde_json::Value) -> Result<ProofBundle, GpcError>;

    fn verify(
        &self,
        artifacts: &ArtifactPaths,
        proof: &ProofBundle,
        public_signals: &[String],
    ) -> Result<bool, GpcError>;
}

/// Opaque proof as returned by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub proof: serde_json::Value,
    pub public_signals: Vec<String>,
}

/// Return a catalogued circuit for `req`, compiling and recording a new one
/// when none fits.
pub fn prepare_circuit(
    catalog: &CircuitCatalog,
    store: &CatalogStore,
    req: &RequirementVector,
    artifacts_dir: &Path,
    compiler: &dyn CircuitCompiler,
) -> Result<CircuitDescriptor, GpcError> {
    if let CircuitSelection::Found(circuit) = catalog.find_circuit(req, artifacts_dir) {
        return Ok(circuit);
    }

    let capacity = CircuitCapacity::from(req);
    tracing::info!(circuit_id = %capacity.circuit_id(), "compiling circuit");
    let circuit = compiler.compile(&capacity, artifacts_dir)?;

    if !circuit.capacity.satisfies(req) {
        return Err(GpcError::Backend(format!(
            "compiled circuit {} does not satisfy the requested capacity",
            circuit.circuit_id
        )));
    }
    let artifacts = circuit.artifacts(artifacts_dir);
    if !artifacts.all_present() {
        return Err(GpcError::Backend(format!(
            "compiled circuit {} is missing artifacts {:?}",
            circuit.circuit_id,
            artifacts.missing()
        )));
    }

    // Recompiling a stored circuit whose artifacts were lost leaves the
    // store as is.
    if !store.load()?.circuits().contains(&circuit) {
        store.append(circuit.clone())?;
    }
    Ok(circuit)
}
