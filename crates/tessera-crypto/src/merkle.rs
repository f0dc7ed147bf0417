use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::hashing::{hash_pair, Hash};

/// Smallest Merkle depth any POD reports.
pub const MIN_MERKLE_DEPTH: usize = 1;
/// Largest Merkle depth a POD may have (1024 entries).
pub const MAX_MERKLE_DEPTH: usize = 10;

/// Minimal tree depth for `entry_count` leaves: `ceil(log2(max(n, 1)))`,
/// clamped to [`MIN_MERKLE_DEPTH`].
pub fn min_merkle_depth(entry_count: usize) -> usize {
    let n = entry_count.max(1);
    let depth = (usize::BITS - (n - 1).leading_zeros()) as usize;
    depth.max(MIN_MERKLE_DEPTH)
}

/// Binary Merkle tree over field-element leaves.
///
/// An odd node at any level is paired with itself, so a tree over `n`
/// leaves has exactly `ceil(log2(n))` levels above the leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build the tree. Zero leaves is an error, not an empty-root convention.
    pub fn build(leaves: Vec<Hash>) -> Result<Self, CryptoError> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyTree);
        }
        let depth = min_merkle_depth(leaves.len());
        if depth > MAX_MERKLE_DEPTH {
            return Err(CryptoError::TreeTooDeep {
                entries: leaves.len(),
                depth,
                max: MAX_MERKLE_DEPTH,
            });
        }

        let mut levels = vec![leaves];
        while levels.last().map_or(0, Vec::len) > 1 {
            let current = &levels[levels.len() - 1];
            let next: Vec<Hash> = current
                .chunks(2)
                .map(|chunk| {
                    let left = &chunk[0];
                    let right = chunk.get(1).unwrap_or(left);
                    hash_pair(left, right)
                })
                .collect();
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// Root hash.
    pub fn root(&self) -> &Hash {
        &self.levels[self.levels.len() - 1][0]
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, CryptoError> {
        let leaf = self.levels[0].get(index).cloned().ok_or_else(|| {
            CryptoError::InvalidProof(format!(
                "leaf index {} out of bounds for {} leaves",
                index,
                self.leaf_count()
            ))
        })?;

        let mut siblings = Vec::with_capacity(self.depth());
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_position = position ^ 1;
            let sibling = level.get(sibling_position).unwrap_or(&level[position]);
            siblings.push(sibling.clone());
            position /= 2;
        }

        Ok(MerkleProof {
            leaf,
            index,
            siblings,
        })
    }
}

/// Inclusion proof of one leaf in a [`MerkleTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf: Hash,
    pub index: usize,
    pub siblings: Vec<Hash>,
}

impl MerkleProof {
    /// Recompute the root from the leaf and siblings.
    pub fn compute_root(&self) -> Hash {
        let mut current = self.leaf.clone();
        let mut position = self.index;
        for sibling in &self.siblings {
            current = if position % 2 == 0 {
                hash_pair(&current, sibling)
            } else {
                hash_pair(sibling, &current)
            };
            position /= 2;
        }
        current
    }

    pub fn verify(&self, root: &Hash) -> bool {
        self.compute_root() == *root
    }
}
