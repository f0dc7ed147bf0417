use serde::{Deserialize, Serialize};

use tessera_core::types::{decode_public_key, encode_public_key};
use tessera_core::{check_name, CoreError, FieldElement, PodEntries, PodValue, VirtualEntry};
use tessera_crypto::{
    hash_name, hash_pair, hash_value, min_merkle_depth, sign, verify, CryptoError, KeyPair,
    MerkleProof, MerkleTree, PublicKey, Signature,
};

use crate::error::PodError;

/// Build the content tree: one leaf per entry, in name order,
/// `hash_pair(hash_name(name), hash_value(value))`.
pub fn compute_content_tree(entries: &PodEntries) -> Result<MerkleTree, PodError> {
    if entries.is_empty() {
        return Err(PodError::InvalidPod("a POD must have at least one entry".into()));
    }
    for name in entries.keys() {
        check_name(name)?;
    }
    let leaves = entries
        .iter()
        .map(|(name, value)| hash_pair(&hash_name(name), &hash_value(value)))
        .collect();
    MerkleTree::build(leaves).map_err(|e| match e {
        CryptoError::TreeTooDeep { .. } => CoreError::RangeError(e.to_string()).into(),
        other => other.into(),
    })
}

/// A signed, content-addressed record of named typed values.
///
/// Immutable once constructed. Identity is the content ID.
#[derive(Debug, Clone)]
pub struct Pod {
    entries: PodEntries,
    tree: MerkleTree,
    signature: [u8; 64],
    signer_public_key: [u8; 32],
}

impl PartialEq for Pod {
    fn eq(&self, other: &Self) -> bool {
        self.content_id() == other.content_id()
    }
}

impl Eq for Pod {}

impl Pod {
    /// Sign a set of entries. The signature covers the content ID.
    pub fn sign(entries: PodEntries, keypair: &KeyPair) -> Result<Self, PodError> {
        let tree = compute_content_tree(&entries)?;
        let signature = sign(&tree.root().to_bytes_be(), keypair);
        let pod = Self {
            entries,
            tree,
            signature: signature.to_bytes(),
            signer_public_key: *keypair.public_key().as_bytes(),
        };

        tracing::info!(
            content_id = %pod.content_id(),
            entries = pod.entries.len(),
            signer = %encode_public_key(&pod.signer_public_key),
            "pod signed"
        );

        Ok(pod)
    }

    /// Parse the serialized form. Checks structure only; the signature is
    /// not verified here, call [`Pod::verify_signature`] for that.
    pub fn from_serialized(serialized: SerializedPod) -> Result<Self, PodError> {
        let signature_bytes = hex::decode(serialized.signature.trim()).map_err(|e| {
            PodError::InvalidPod(format!("signature is not valid hex: {}", e))
        })?;
        let signature: [u8; 64] = signature_bytes.as_slice().try_into().map_err(|_| {
            PodError::InvalidPod(format!(
                "signature must be 64 bytes, got {}",
                signature_bytes.len()
            ))
        })?;
        let signer_public_key = decode_public_key(&serialized.signer_public_key)?;
        let tree = compute_content_tree(&serialized.entries)?;

        Ok(Self {
            entries: serialized.entries,
            tree,
            signature,
            signer_public_key,
        })
    }

    /// Parse from JSON text. Rejects documents missing any top-level field.
    pub fn from_json(json: &str) -> Result<Self, PodError> {
        let serialized: SerializedPod = serde_json::from_str(json)?;
        Self::from_serialized(serialized)
    }

    pub fn serialize(&self) -> SerializedPod {
        SerializedPod {
            entries: self.entries.clone(),
            signature: hex::encode(self.signature),
            signer_public_key: encode_public_key(&self.signer_public_key),
        }
    }

    pub fn to_json(&self) -> Result<String, PodError> {
        Ok(serde_json::to_string(&self.serialize())?)
    }

    /// Internal verification: recompute the content ID from the entries
    /// and check the signature against the embedded key. Says nothing
    /// about whether the signer is trusted.
    pub fn verify_signature(&self) -> bool {
        let content_id = match compute_content_tree(&self.entries) {
            Ok(tree) => tree.root().clone(),
            Err(_) => return false,
        };
        if content_id != *self.content_id() {
            return false;
        }
        let public_key = match PublicKey::from_bytes(&self.signer_public_key) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let signature = match Signature::from_bytes(&self.signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        let valid = verify(&content_id.to_bytes_be(), &signature, &public_key).is_ok();
        if !valid {
            tracing::debug!(content_id = %content_id, "pod signature rejected");
        }
        valid
    }

    pub fn content_id(&self) -> &FieldElement {
        self.tree.root()
    }

    pub fn entries(&self) -> &PodEntries {
        &self.entries
    }

    pub fn signer_public_key(&self) -> &[u8; 32] {
        &self.signer_public_key
    }

    pub fn signature(&self) -> &[u8; 64] {
        &self.signature
    }

    /// Merkle depth a circuit needs to prove membership of any entry.
    pub fn merkle_depth(&self) -> usize {
        min_merkle_depth(self.entries.len())
    }

    /// Value of a virtual entry.
    pub fn virtual_entry(&self, entry: VirtualEntry) -> PodValue {
        match entry {
            VirtualEntry::ContentId => PodValue::Cryptographic(self.content_id().clone()),
            VirtualEntry::SignerPublicKey => PodValue::EddsaPubkey(self.signer_public_key),
        }
    }

    /// Resolve an ordinary or virtual (`$contentID`, `$signerPublicKey`) name.
    pub fn resolve_entry(&self, name: &str) -> Option<PodValue> {
        match name.parse::<VirtualEntry>() {
            Ok(virtual_entry) => Some(self.virtual_entry(virtual_entry)),
            Err(_) => self.entries.get(name).cloned(),
        }
    }

    /// Membership proof for a named entry against the content ID.
    pub fn entry_proof(&self, name: &str) -> Result<EntryProof, PodError> {
        let (index, (_, value)) = self
            .entries
            .iter()
            .enumerate()
            .find(|(_, (entry_name, _))| entry_name.as_str() == name)
            .ok_or_else(|| PodError::EntryNotFound(name.to_string()))?;
        Ok(EntryProof {
            name: name.to_string(),
            value: value.clone(),
            proof: self.tree.proof(index)?,
        })
    }
}

/// Proof that an entry with a given value is part of a POD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryProof {
    pub name: String,
    pub value: PodValue,
    pub proof: MerkleProof,
}

impl EntryProof {
    pub fn verify(&self, content_id: &FieldElement) -> bool {
        let expected_leaf = hash_pair(&hash_name(&self.name), &hash_value(&self.value));
        expected_leaf == self.proof.leaf && self.proof.verify(content_id)
    }
}

/// JSON form of a POD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedPod {
    pub entries: PodEntries,
    /// Hex-encoded Ed25519 signature over the content ID.
    pub signature: String,
    /// Base64-encoded signer public key.
    pub signer_public_key: String,
}
