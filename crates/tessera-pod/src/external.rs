use std::collections::{BTreeMap, BTreeSet};

use tessera_core::{PodEntries, PodValue};
use tessera_crypto::standard_tree::{hash_leaf, verify_multiproof, verify_proof, TreeDump};
use tessera_crypto::{Bytes32, MultiProof, StandardMerkleTree};

use crate::abi::{abi_encode, to_abi_value, AbiType, AbiValue};
use crate::error::PodError;

/// Entry name that holds the commitment itself and is never a leaf.
pub const RESERVED_COMMITMENT_FIELD: &str = "commitment";

/// Encode one `(name, value)` leaf as the ABI tuple `(string, T)`.
pub fn encode_entry(name: &str, value: &PodValue, ty: &AbiType) -> Result<Vec<u8>, PodError> {
    let abi_value = to_abi_value(name, value, ty)?;
    abi_encode(
        &[AbiType::String, ty.clone()],
        &[AbiValue::String(name.to_string()), abi_value],
    )
    .map_err(|reason| PodError::Encoding {
        entry: name.to_string(),
        abi_type: ty.to_string(),
        reason,
    })
}

/// Build the keccak commitment over `entries` using `types` to pick each
/// entry's encoding.
///
/// Every entry needs a mapping. A mapped name with no entry commits to the
/// zero value of its encoding.
pub fn build_external_commitment(
    entries: &PodEntries,
    types: &BTreeMap<String, AbiType>,
) -> Result<ExternalCommitment, PodError> {
    let names: BTreeSet<&str> = entries
        .keys()
        .chain(types.keys())
        .map(String::as_str)
        .filter(|name| *name != RESERVED_COMMITMENT_FIELD)
        .collect();

    let mut leaves = Vec::with_capacity(names.len());
    for name in names {
        let ty = types
            .get(name)
            .ok_or_else(|| PodError::MissingTypeMapping(name.to_string()))?;
        let value = entries.get(name).unwrap_or(&PodValue::Null);
        let encoded = encode_entry(name, value, ty)?;
        leaves.push((name.to_string(), hash_leaf(&encoded)));
    }

    if leaves.is_empty() {
        return Err(PodError::NoCommitmentLeaves);
    }

    let tree = StandardMerkleTree::of(leaves)?;
    let commitment = ExternalCommitment { tree };
    tracing::debug!(
        root = %commitment.root_hex(),
        leaves = commitment.tree.len(),
        "external commitment built"
    );
    Ok(commitment)
}

/// Application-level commitment over a record's entries.
#[derive(Debug, Clone)]
pub struct ExternalCommitment {
    tree: StandardMerkleTree,
}

impl ExternalCommitment {
    pub fn root(&self) -> Bytes32 {
        self.tree.root()
    }

    pub fn root_hex(&self) -> String {
        format!("0x{}", hex::encode(self.root()))
    }

    /// Committed entry names, in leaf order.
    pub fn entry_names(&self) -> Vec<&str> {
        self.tree.values().iter().map(|v| v.label.as_str()).collect()
    }

    fn value_index(&self, name: &str) -> Result<usize, PodError> {
        self.tree
            .values()
            .iter()
            .position(|v| v.label == name)
            .ok_or_else(|| PodError::EntryNotFound(name.to_string()))
    }

    pub fn leaf(&self, name: &str) -> Result<Bytes32, PodError> {
        let index = self.value_index(name)?;
        Ok(self.tree.values()[index].leaf)
    }

    pub fn proof(&self, name: &str) -> Result<Vec<Bytes32>, PodError> {
        let index = self.value_index(name)?;
        Ok(self.tree.get_proof(index)?)
    }

    /// One proof covering several entries.
    pub fn multiproof(&self, names: &[&str]) -> Result<MultiProof, PodError> {
        let indices = names
            .iter()
            .map(|name| self.value_index(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.tree.get_multiproof(&indices)?)
    }

    pub fn verify_proof(&self, name: &str, proof: &[Bytes32]) -> Result<bool, PodError> {
        Ok(verify_proof(&self.root(), &self.leaf(name)?, proof))
    }

    pub fn verify_multiproof(&self, multiproof: &MultiProof) -> bool {
        verify_multiproof(&self.root(), multiproof)
    }

    /// Snapshot sufficient to regenerate proofs for any subset of entries.
    pub fn dump(&self) -> TreeDump {
        self.tree.dump()
    }

    pub fn load(dump: TreeDump) -> Result<Self, PodError> {
        Ok(Self {
            tree: StandardMerkleTree::load(dump)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::ErrorKind;

    fn entries() -> PodEntries {
        let mut e = PodEntries::new();
        e.insert("name".into(), PodValue::string("Starship"));
        e.insert("level".into(), PodValue::int(12));
        e.insert("active".into(), PodValue::boolean(true));
        e.insert("scores".into(), PodValue::string("[3, 1, 4]"));
        e.insert(RESERVED_COMMITMENT_FIELD.into(), PodValue::string("0x00"));
        e
    }

    fn types() -> BTreeMap<String, AbiType> {
        [
            ("name", "string"),
            ("level", "uint64"),
            ("active", "bool"),
            ("scores", "uint8[]"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.parse().unwrap()))
        .collect()
    }

    #[test]
    fn test_build_commitment() {
        let commitment = build_external_commitment(&entries(), &types()).unwrap();
        assert_eq!(commitment.entry_names(), vec!["active", "level", "name", "scores"]);
        assert!(commitment.root_hex().starts_with("0x"));
        assert_eq!(commitment.root_hex().len(), 66);
    }

    #[test]
    fn test_deterministic_root() {
        let a = build_external_commitment(&entries(), &types()).unwrap();
        let b = build_external_commitment(&entries(), &types()).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_value_change_changes_root() {
        let a = build_external_commitment(&entries(), &types()).unwrap();
        let mut changed = entries();
        changed.insert("level".into(), PodValue::int(13));
        let b = build_external_commitment(&changed, &types()).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_reserved_field_ignored() {
        let a = build_external_commitment(&entries(), &types()).unwrap();
        let mut without = entries();
        without.remove(RESERVED_COMMITMENT_FIELD);
        let b = build_external_commitment(&without, &types()).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_missing_mapping_fails() {
        let mut t = types();
        t.remove("level");
        let err = build_external_commitment(&entries(), &t).unwrap_err();
        assert!(matches!(err, PodError::MissingTypeMapping(ref n) if n == "level"));
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn test_absent_mapped_entry_commits_zero() {
        let mut t = types();
        t.insert("owner".into(), AbiType::Address);
        let mut with_null = entries();
        with_null.insert("owner".into(), PodValue::Null);
        let a = build_external_commitment(&entries(), &t).unwrap();
        let b = build_external_commitment(&with_null, &t).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_zero_leaves_fails() {
        let mut only_reserved = PodEntries::new();
        only_reserved.insert(RESERVED_COMMITMENT_FIELD.into(), PodValue::int(0));
        let err = build_external_commitment(&only_reserved, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, PodError::NoCommitmentLeaves));
    }

    #[test]
    fn test_bad_array_fails() {
        let mut e = entries();
        e.insert("scores".into(), PodValue::string("[3, \"x\"]"));
        assert!(matches!(
            build_external_commitment(&e, &types()),
            Err(PodError::Encoding { .. })
        ));
    }

    #[test]
    fn test_proofs_and_multiproof() {
        let commitment = build_external_commitment(&entries(), &types()).unwrap();
        for name in commitment.entry_names() {
            let proof = commitment.proof(name).unwrap();
            assert!(commitment.verify_proof(name, &proof).unwrap());
        }
        let multi = commitment.multiproof(&["level", "scores"]).unwrap();
        assert!(commitment.verify_multiproof(&multi));
        assert!(commitment.proof("missing").is_err());
    }

    #[test]
    fn test_dump_and_load() {
        let commitment = build_external_commitment(&entries(), &types()).unwrap();
        let json = serde_json::to_string(&commitment.dump()).unwrap();
        let dump: TreeDump = serde_json::from_str(&json).unwrap();
        let loaded = ExternalCommitment::load(dump).unwrap();
        assert_eq!(loaded.root(), commitment.root());
        let multi = loaded.multiproof(&["name", "active"]).unwrap();
        assert!(commitment.verify_multiproof(&multi));
    }
}
