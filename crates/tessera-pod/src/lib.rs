//! Tessera PODs: Signed, content-addressed records of named typed values,
//! their serialized form, and the ABI-encoded external commitment tree.

pub mod abi;
pub mod error;
pub mod external;
pub mod pod;

pub use abi::{AbiType, AbiValue};
pub use error::PodError;
pub use external::{build_external_commitment, ExternalCommitment, RESERVED_COMMITMENT_FIELD};
pub use pod::{compute_content_tree, EntryProof, Pod, SerializedPod};
