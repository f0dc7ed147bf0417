//! Concrete inputs to a proof: the PODs, the owner identity and the
//! membership lists named by the configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use tessera_core::types::{decode_public_key, encode_public_key};
use tessera_core::{FieldElement, PodValue};
use tessera_crypto::{hash_tuple, hash_value, Hash};
use tessera_pod::{Pod, SerializedPod};

use crate::error::GpcError;

/// One element of a membership list: a JSON array is a tuple, an object a
/// single value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListElement {
    Tuple(Vec<PodValue>),
    Value(PodValue),
}

impl<'de> Deserialize<'de> for ListElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let element = if raw.is_array() {
            serde_json::from_value(raw).map(Self::Tuple)
        } else {
            serde_json::from_value(raw).map(Self::Value)
        };
        element.map_err(serde::de::Error::custom)
    }
}

impl ListElement {
    /// Number of values per element: 1 for plain values.
    pub fn width(&self) -> usize {
        match self {
            Self::Value(_) => 1,
            Self::Tuple(values) => values.len(),
        }
    }

    /// Hash compared against entry and tuple hashes during membership checks.
    pub fn hash(&self) -> Hash {
        match self {
            Self::Value(value) => hash_value(value),
            Self::Tuple(values) => hash_tuple(values),
        }
    }
}

pub type MembershipList = Vec<ListElement>;

/// Identity of the prover, checked against owner entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerInput {
    pub identity_v3: Option<FieldElement>,
    /// Ed25519 public key bytes. Checked to be a curve point by `check_inputs`.
    pub identity_v4: Option<[u8; 32]>,
    pub external_nullifier: Option<PodValue>,
}

/// Parsed proof inputs.
#[derive(Debug, Clone, Default)]
pub struct ProofInputs {
    pub pods: BTreeMap<String, Pod>,
    pub owner: Option<OwnerInput>,
    pub membership_lists: BTreeMap<String, MembershipList>,
    pub watermark: Option<PodValue>,
}

impl ProofInputs {
    /// Parse inputs. Each POD is parsed structurally; signatures are left to
    /// the caller.
    pub fn from_serialized(serialized: SerializedProofInputs) -> Result<Self, GpcError> {
        let pods = serialized
            .pods
            .into_iter()
            .map(|(name, pod)| Ok((name, Pod::from_serialized(pod)?)))
            .collect::<Result<BTreeMap<_, _>, GpcError>>()?;

        let owner = match serialized.owner {
            Some(owner) => Some(OwnerInput {
                identity_v3: owner
                    .identity_v3
                    .map(|s| s.parse::<FieldElement>())
                    .transpose()?,
                identity_v4: owner
                    .identity_v4
                    .map(|s| decode_public_key(&s))
                    .transpose()?,
                external_nullifier: owner.external_nullifier,
            }),
            None => None,
        };

        Ok(Self {
            pods,
            owner,
            membership_lists: serialized.membership_lists,
            watermark: serialized.watermark,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, GpcError> {
        let serialized: SerializedProofInputs = serde_json::from_str(json)?;
        Self::from_serialized(serialized)
    }

    pub fn load(path: &Path) -> Result<Self, GpcError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn serialize(&self) -> SerializedProofInputs {
        SerializedProofInputs {
            pods: self
                .pods
                .iter()
                .map(|(name, pod)| (name.clone(), pod.serialize()))
                .collect(),
            owner: self.owner.as_ref().map(|owner| SerializedOwner {
                identity_v3: owner.identity_v3.as_ref().map(ToString::to_string),
                identity_v4: owner.identity_v4.as_ref().map(encode_public_key),
                external_nullifier: owner.external_nullifier.clone(),
            }),
            membership_lists: self.membership_lists.clone(),
            watermark: self.watermark.clone(),
        }
    }
}

/// JSON form of [`ProofInputs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializedProofInputs {
    pub pods: BTreeMap<String, SerializedPod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<SerializedOwner>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub membership_lists: BTreeMap<String, MembershipList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<PodValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializedOwner {
    /// Decimal or `0x` hex field element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_v3: Option<String>,
    /// Base64 public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_v4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_nullifier: Option<PodValue>,
}
