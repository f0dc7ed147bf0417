pub mod error;
pub mod hashing;
pub mod keys;
pub mod merkle;
pub mod signing;
pub mod standard_tree;

pub use error::CryptoError;
pub use hashing::{hash_name, hash_pair, hash_tuple, hash_value, Hash};
pub use keys::{KeyPair, PublicKey};
pub use merkle::{min_merkle_depth, MerkleProof, MerkleTree, MAX_MERKLE_DEPTH, MIN_MERKLE_DEPTH};
pub use signing::{sign, verify, Signature};
pub use standard_tree::{keccak256, Bytes32, MultiProof, StandardMerkleTree, TreeDump};
