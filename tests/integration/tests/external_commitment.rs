//! Integration test: keccak commitment over a signed POD's entries.

use std::collections::BTreeMap;

use tessera_core::{PodEntries, PodValue};
use tessera_crypto::KeyPair;
use tessera_pod::{build_external_commitment, AbiType, ExternalCommitment, Pod, PodError};

fn record() -> Pod {
    let mut entries = PodEntries::new();
    entries.insert("holder".into(), PodValue::string("alice"));
    entries.insert("score".into(), PodValue::int(812));
    entries.insert("verified".into(), PodValue::boolean(true));
    entries.insert("memo".into(), PodValue::bytes(vec![1, 2, 3]));
    Pod::sign(entries, &KeyPair::from_seed(&[11u8; 32])).unwrap()
}

fn types() -> BTreeMap<String, AbiType> {
    [
        ("holder", "string"),
        ("score", "uint64"),
        ("verified", "bool"),
        ("memo", "bytes"),
        ("expiry", "uint256"),
    ]
    .into_iter()
    .map(|(k, t)| (k.to_string(), t.parse().unwrap()))
    .collect()
}

#[test]
fn test_commitment_covers_pod_entries() {
    let pod = record();
    let commitment = build_external_commitment(pod.entries(), &types()).unwrap();
    assert_eq!(
        commitment.entry_names(),
        vec!["expiry", "holder", "memo", "score", "verified"]
    );
    for name in commitment.entry_names() {
        let proof = commitment.proof(name).unwrap();
        assert!(commitment.verify_proof(name, &proof).unwrap());
    }
}

#[test]
fn test_commitment_depends_on_values() {
    let pod = record();
    let base = build_external_commitment(pod.entries(), &types()).unwrap();

    let mut changed = pod.entries().clone();
    changed.insert("score".into(), PodValue::int(813));
    let other = build_external_commitment(&changed, &types()).unwrap();
    assert_ne!(base.root(), other.root());
    assert_eq!(base.leaf("holder").unwrap(), other.leaf("holder").unwrap());
}

#[test]
fn test_reserved_field_is_ignored() {
    let pod = record();
    let base = build_external_commitment(pod.entries(), &types()).unwrap();

    let mut with_reserved = pod.entries().clone();
    with_reserved.insert("commitment".into(), PodValue::string(base.root_hex()));
    let again = build_external_commitment(&with_reserved, &types()).unwrap();
    assert_eq!(base.root(), again.root());
}

#[test]
fn test_unmapped_entry_rejected() {
    let mut types = types();
    types.remove("memo");
    let err = build_external_commitment(record().entries(), &types).unwrap_err();
    assert!(matches!(err, PodError::MissingTypeMapping(name) if name == "memo"));
}

#[test]
fn test_dump_reload_multiproof() {
    let commitment = build_external_commitment(record().entries(), &types()).unwrap();
    let json = serde_json::to_string(&commitment.dump()).unwrap();
    let reloaded = ExternalCommitment::load(serde_json::from_str(&json).unwrap()).unwrap();
    assert_eq!(reloaded.root(), commitment.root());

    let multiproof = reloaded.multiproof(&["score", "verified"]).unwrap();
    assert!(commitment.verify_multiproof(&multiproof));

    let mut forged = multiproof.clone();
    forged.leaves[0][0] ^= 1;
    assert!(!commitment.verify_multiproof(&forged));
}
