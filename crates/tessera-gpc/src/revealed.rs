use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tessera_core::types::encode_public_key;
use tessera_core::{FieldElement, PodValue};

use crate::config::ProofConfig;
use crate::error::GpcError;
use crate::inputs::{MembershipList, ProofInputs};

/// Values a proof makes public, handed to the prover with the witness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedClaims {
    pub pods: BTreeMap<String, RevealedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<RevealedOwner>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub membership_lists: BTreeMap<String, MembershipList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<PodValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedObject {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entries: BTreeMap<String, PodValue>,
    #[serde(rename = "contentID", default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<FieldElement>,
    /// Base64 public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedOwner {
    pub external_nullifier: PodValue,
}

/// Collect the revealed values for a validated `(config, inputs)` pair.
///
/// Every object appears, even with nothing revealed, since the verifier
/// still learns that the object took part.
pub fn compile_revealed_claims(config: &ProofConfig, inputs: &ProofInputs) -> Result<RevealedClaims, GpcError> {
    let mut pods = BTreeMap::new();
    for (object_name, object) in &config.pods {
        let pod = inputs.pods.get(object_name).ok_or_else(|| {
            GpcError::ReferenceError(format!("configured object {} has no input POD", object_name))
        })?;

        let mut revealed = RevealedObject::default();
        for (entry_name, entry) in &object.entries {
            if !entry.is_revealed {
                continue;
            }
            let value = pod.entries().get(entry_name).ok_or_else(|| {
                GpcError::ReferenceError(format!(
                    "input POD {} has no entry {}",
                    object_name, entry_name
                ))
            })?;
            revealed.entries.insert(entry_name.clone(), value.clone());
        }
        if object.content_id.as_ref().is_some_and(|c| c.is_revealed) {
            revealed.content_id = Some(pod.content_id().clone());
        }
        if object.signer_public_key.as_ref().is_some_and(|c| c.is_revealed) {
            revealed.signer_public_key = Some(encode_public_key(pod.signer_public_key()));
        }
        pods.insert(object_name.clone(), revealed);
    }

    let owner = inputs
        .owner
        .as_ref()
        .and_then(|owner| owner.external_nullifier.clone())
        .map(|external_nullifier| RevealedOwner { external_nullifier });

    Ok(RevealedClaims {
        pods,
        owner,
        membership_lists: inputs.membership_lists.clone(),
        watermark: inputs.watermark.clone(),
    })
}
