//! Keccak-256 "standard" Merkle tree with single and multi-leaf proofs.
//!
//! The layout follows the widely deployed on-chain convention: leaves are
//! double-hashed by the caller, sorted by hash, and stored at the tail of a
//! flat array of `2n - 1` nodes; every internal node hashes its two children
//! in sorted order, so proofs need no direction bits.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::CryptoError;

pub type Bytes32 = [u8; 32];

const DUMP_FORMAT: &str = "standard-v1";

pub fn keccak256(data: &[u8]) -> Bytes32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Leaf hash for an encoded value: `keccak256(keccak256(encoded))`.
pub fn hash_leaf(encoded: &[u8]) -> Bytes32 {
    keccak256(&keccak256(encoded))
}

fn hash_node(a: &Bytes32, b: &Bytes32) -> Bytes32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut input = [0u8; 64];
    input[..32].copy_from_slice(lo);
    input[32..].copy_from_slice(hi);
    keccak256(&input)
}

fn parent(index: usize) -> usize {
    (index - 1) / 2
}

fn sibling(index: usize) -> usize {
    if index % 2 == 0 {
        index - 1
    } else {
        index + 1
    }
}

/// A labelled leaf in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeValue {
    pub label: String,
    pub leaf: Bytes32,
    pub tree_index: usize,
}

/// Proof for several leaves at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiProof {
    #[serde(with = "hex_list")]
    pub leaves: Vec<Bytes32>,
    #[serde(with = "hex_list")]
    pub proof: Vec<Bytes32>,
    pub proof_flags: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct StandardMerkleTree {
    tree: Vec<Bytes32>,
    values: Vec<TreeValue>,
}

impl StandardMerkleTree {
    /// Build from `(label, leaf_hash)` pairs. Zero leaves is an error.
    pub fn of(leaves: Vec<(String, Bytes32)>) -> Result<Self, CryptoError> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyTree);
        }

        let mut order: Vec<usize> = (0..leaves.len()).collect();
        order.sort_by(|a, b| leaves[*a].1.cmp(&leaves[*b].1));

        let n = leaves.len();
        let mut tree = vec![[0u8; 32]; 2 * n - 1];
        let mut tree_index_of = vec![0usize; n];
        for (sorted_pos, value_index) in order.iter().enumerate() {
            let tree_index = tree.len() - 1 - sorted_pos;
            tree[tree_index] = leaves[*value_index].1;
            tree_index_of[*value_index] = tree_index;
        }
        for i in (0..tree.len() - n).rev() {
            tree[i] = hash_node(&tree[2 * i + 1], &tree[2 * i + 2]);
        }

        let values = leaves
            .into_iter()
            .enumerate()
            .map(|(i, (label, leaf))| TreeValue {
                label,
                leaf,
                tree_index: tree_index_of[i],
            })
            .collect();

        Ok(Self { tree, values })
    }

    pub fn root(&self) -> Bytes32 {
        self.tree[0]
    }

    pub fn values(&self) -> &[TreeValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn tree_index(&self, value_index: usize) -> Result<usize, CryptoError> {
        self.values
            .get(value_index)
            .map(|v| v.tree_index)
            .ok_or_else(|| {
                CryptoError::InvalidProof(format!(
                    "value index {} out of bounds for {} leaves",
                    value_index,
                    self.values.len()
                ))
            })
    }

    /// Sibling path from the leaf at `value_index` to the root.
    pub fn get_proof(&self, value_index: usize) -> Result<Vec<Bytes32>, CryptoError> {
        let mut index = self.tree_index(value_index)?;
        let mut proof = Vec::new();
        while index > 0 {
            proof.push(self.tree[sibling(index)]);
            index = parent(index);
        }
        Ok(proof)
    }

    /// Proof covering every leaf in `value_indices`.
    pub fn get_multiproof(&self, value_indices: &[usize]) -> Result<MultiProof, CryptoError> {
        let mut indices = value_indices
            .iter()
            .map(|i| self.tree_index(*i))
            .collect::<Result<Vec<_>, _>>()?;
        indices.sort_unstable_by(|a, b| b.cmp(a));
        if indices.windows(2).any(|w| w[0] == w[1]) {
            return Err(CryptoError::InvalidProof("duplicate leaf index".into()));
        }

        let mut stack: VecDeque<usize> = indices.iter().copied().collect();
        let mut proof = Vec::new();
        let mut proof_flags = Vec::new();

        while let Some(&j) = stack.front() {
            if j == 0 {
                break;
            }
            stack.pop_front();
            let s = sibling(j);
            let p = parent(j);
            if stack.front() == Some(&s) {
                proof_flags.push(true);
                stack.pop_front();
            } else {
                proof_flags.push(false);
                proof.push(self.tree[s]);
            }
            stack.push_back(p);
        }

        if indices.is_empty() {
            proof.push(self.tree[0]);
        }

        Ok(MultiProof {
            leaves: indices.iter().map(|i| self.tree[*i]).collect(),
            proof,
            proof_flags,
        })
    }

    /// Serializable snapshot sufficient to regenerate any proof.
    pub fn dump(&self) -> TreeDump {
        TreeDump {
            format: DUMP_FORMAT.to_string(),
            tree: self.tree.clone(),
            values: self
                .values
                .iter()
                .map(|v| DumpValue {
                    label: v.label.clone(),
                    tree_index: v.tree_index,
                })
                .collect(),
        }
    }

    /// Rebuild a tree from a dump, checking its internal consistency.
    pub fn load(dump: TreeDump) -> Result<Self, CryptoError> {
        if dump.format != DUMP_FORMAT {
            return Err(CryptoError::InvalidInput(format!(
                "unknown tree dump format {:?}",
                dump.format
            )));
        }
        if dump.values.is_empty() || dump.tree.len() != 2 * dump.values.len() - 1 {
            return Err(CryptoError::InvalidInput(
                "tree size does not match value count".into(),
            ));
        }
        let leaf_start = dump.tree.len() - dump.values.len();
        for i in 0..leaf_start {
            if dump.tree[i] != hash_node(&dump.tree[2 * i + 1], &dump.tree[2 * i + 2]) {
                return Err(CryptoError::InvalidInput(format!(
                    "tree node {} does not match its children",
                    i
                )));
            }
        }
        let mut values = Vec::with_capacity(dump.values.len());
        for v in dump.values {
            if v.tree_index < leaf_start || v.tree_index >= dump.tree.len() {
                return Err(CryptoError::InvalidInput(format!(
                    "value {:?} points outside the leaf range",
                    v.label
                )));
            }
            values.push(TreeValue {
                leaf: dump.tree[v.tree_index],
                label: v.label,
                tree_index: v.tree_index,
            });
        }
        Ok(Self {
            tree: dump.tree,
            values,
        })
    }
}

/// Check a single-leaf proof.
pub fn verify_proof(root: &Bytes32, leaf: &Bytes32, proof: &[Bytes32]) -> bool {
    let computed = proof.iter().fold(*leaf, |acc, p| hash_node(&acc, p));
    computed == *root
}

/// Recompute the root implied by a multiproof.
pub fn process_multiproof(multiproof: &MultiProof) -> Result<Bytes32, CryptoError> {
    let mut stack: VecDeque<Bytes32> = multiproof.leaves.iter().copied().collect();
    let mut proof: VecDeque<Bytes32> = multiproof.proof.iter().copied().collect();

    if stack.len() + proof.len() != multiproof.proof_flags.len() + 1 {
        return Err(CryptoError::InvalidProof(
            "leaf, proof and flag counts are inconsistent".into(),
        ));
    }

    for flag in &multiproof.proof_flags {
        let a = stack
            .pop_front()
            .ok_or_else(|| CryptoError::InvalidProof("stack underflow".into()))?;
        let b = if *flag {
            stack.pop_front()
        } else {
            proof.pop_front()
        }
        .ok_or_else(|| CryptoError::InvalidProof("proof underflow".into()))?;
        stack.push_back(hash_node(&a, &b));
    }

    stack
        .pop_back()
        .or_else(|| proof.pop_front())
        .ok_or_else(|| CryptoError::InvalidProof("empty multiproof".into()))
}

pub fn verify_multiproof(root: &Bytes32, multiproof: &MultiProof) -> bool {
    matches!(process_multiproof(multiproof), Ok(computed) if computed == *root)
}

/// JSON snapshot of a [`StandardMerkleTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDump {
    pub format: String,
    #[serde(with = "hex_list")]
    pub tree: Vec<Bytes32>,
    pub values: Vec<DumpValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpValue {
    pub label: String,
    pub tree_index: usize,
}

/// `0x`-prefixed hex encoding for lists of 32-byte words.
mod hex_list {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Bytes32;

    pub fn serialize<S: Serializer>(items: &[Bytes32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(items.iter().map(|b| format!("0x{}", hex::encode(b))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Bytes32>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| {
                let bytes = hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
                Bytes32::try_from(bytes.as_slice())
                    .map_err(|_| serde::de::Error::custom(format!("expected 32 bytes, got {}", bytes.len())))
            })
            .collect()
    }
}
