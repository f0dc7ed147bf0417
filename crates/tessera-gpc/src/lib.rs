//! Tessera GPC: Proof configuration schema, configuration and input
//! validation, circuit requirement derivation, and circuit catalog selection.
//!
//! The flow for a proof is:
//! - [`check_config`] validates a [`ProofConfig`] and derives its requirements
//! - [`check_inputs`] validates [`ProofInputs`] on their own
//! - [`check_inputs_against_config`] checks every constraint on concrete values
//! - [`RequirementVector::merge`] combines both requirement sets
//! - [`CircuitCatalog::find_circuit`] picks the smallest fitting circuit

pub mod backend;
pub mod bounds;
pub mod catalog;
pub mod checks;
pub mod config;
pub mod error;
pub mod identifier;
pub mod inputs;
pub mod requirements;
pub mod revealed;

pub use backend::{prepare_circuit, CircuitCompiler, ProofBundle, ProvingBackend};
pub use bounds::{canonicalize_bounds, CanonicalBounds};
pub use catalog::{
    ArtifactPaths, CatalogStore, CircuitCapacity, CircuitCatalog, CircuitDescriptor,
    CircuitSelection,
};
pub use checks::{check_config, check_inputs, check_inputs_against_config, check_proof_args};
pub use config::{
    EntryConfig, Inequality, ObjectConfig, OwnerIdKind, ProofConfig, RangeSpec, TupleConfig,
    VirtualEntryConfig,
};
pub use error::GpcError;
pub use identifier::{EntryIdentifier, EntryName};
pub use inputs::{ListElement, MembershipList, OwnerInput, ProofInputs, SerializedProofInputs};
pub use requirements::RequirementVector;
pub use revealed::{compile_revealed_claims, RevealedClaims, RevealedObject, RevealedOwner};
