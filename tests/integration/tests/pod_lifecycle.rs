//! Integration test: POD signing, wire form, verification and tampering.

use proptest::prelude::*;

use tessera_core::{FieldElement, PodEntries, PodValue};
use tessera_crypto::KeyPair;
use tessera_pod::{Pod, SerializedPod};

fn sample_entries() -> PodEntries {
    let mut entries = PodEntries::new();
    entries.insert("name".into(), PodValue::string("Nostromo"));
    entries.insert("crew".into(), PodValue::int(7));
    entries.insert("hull".into(), PodValue::bytes(vec![0xde, 0xad, 0xbe, 0xef]));
    entries.insert("registry".into(), PodValue::cryptographic(FieldElement::from_u64(180924609)));
    entries.insert("decommissioned".into(), PodValue::boolean(false));
    entries
}

#[test]
fn test_sign_serialize_parse_verify() {
    let kp = KeyPair::generate();
    let pod = Pod::sign(sample_entries(), &kp).unwrap();
    let json = pod.to_json().unwrap();

    let parsed = Pod::from_json(&json).unwrap();
    assert!(parsed.verify_signature());
    assert_eq!(parsed.content_id(), pod.content_id());
    assert_eq!(parsed.to_json().unwrap(), json);
}

#[test]
fn test_wire_format_fields() {
    let pod = Pod::sign(sample_entries(), &KeyPair::from_seed(&[1u8; 32])).unwrap();
    let value: serde_json::Value = serde_json::from_str(&pod.to_json().unwrap()).unwrap();
    assert_eq!(value["entries"]["crew"]["type"], "int");
    assert_eq!(value["entries"]["crew"]["value"], "7");
    assert_eq!(value["signature"].as_str().unwrap().len(), 128);
    assert!(value["signerPublicKey"].is_string());
}

#[test]
fn test_serialized_roundtrip_is_identity() {
    let pod = Pod::sign(sample_entries(), &KeyPair::from_seed(&[2u8; 32])).unwrap();
    let serialized = pod.serialize();
    let again = Pod::from_serialized(serialized.clone()).unwrap().serialize();
    assert_eq!(serialized, again);
}

#[test]
fn test_non_canonical_entry_spelling_rejected() {
    let pod = Pod::sign(sample_entries(), &KeyPair::from_seed(&[7u8; 32])).unwrap();
    let mut document: serde_json::Value = serde_json::from_str(&pod.to_json().unwrap()).unwrap();
    document["entries"]["crew"]["value"] = serde_json::json!(7);
    assert!(Pod::from_json(&document.to_string()).is_err());

    let mut document: serde_json::Value = serde_json::from_str(&pod.to_json().unwrap()).unwrap();
    document["entries"]["hull"]["value"] = serde_json::json!("0xdeadbeef");
    assert!(Pod::from_json(&document.to_string()).is_err());
}

#[test]
fn test_parse_does_not_verify() {
    let pod = Pod::sign(sample_entries(), &KeyPair::from_seed(&[3u8; 32])).unwrap();
    let mut serialized: SerializedPod = pod.serialize();
    serialized.entries.insert("crew".into(), PodValue::int(8));
    let parsed = Pod::from_serialized(serialized).unwrap();
    assert!(!parsed.verify_signature());
}

#[test]
fn test_virtual_entries_resolve() {
    let kp = KeyPair::from_seed(&[4u8; 32]);
    let pod = Pod::sign(sample_entries(), &kp).unwrap();
    assert_eq!(
        pod.resolve_entry("$signerPublicKey"),
        Some(PodValue::EddsaPubkey(*kp.public_key().as_bytes()))
    );
    assert_eq!(
        pod.resolve_entry("$contentID"),
        Some(PodValue::Cryptographic(pod.content_id().clone()))
    );
    assert_eq!(pod.resolve_entry("$other"), None);
}

#[test]
fn test_entry_proofs_against_content_id() {
    let pod = Pod::sign(sample_entries(), &KeyPair::from_seed(&[5u8; 32])).unwrap();
    let proof = pod.entry_proof("crew").unwrap();
    let json = serde_json::to_string(&proof).unwrap();
    let parsed: tessera_pod::EntryProof = serde_json::from_str(&json).unwrap();
    assert!(parsed.verify(pod.content_id()));
}

proptest! {
    #[test]
    fn test_any_single_entry_mutation_breaks_signature(
        values in prop::collection::btree_map("[a-z][a-z0-9_]{0,8}", any::<i64>(), 1..12),
        delta in 1i64..1000,
        pick in any::<prop::sample::Index>(),
    ) {
        let entries: PodEntries = values
            .iter()
            .map(|(k, v)| (k.clone(), PodValue::int(*v)))
            .collect();
        let pod = Pod::sign(entries, &KeyPair::from_seed(&[6u8; 32])).unwrap();
        prop_assert!(pod.verify_signature());

        let mut serialized = pod.serialize();
        let name = pick.get(&values.keys().cloned().collect::<Vec<_>>()).clone();
        let old = values[&name];
        serialized.entries.insert(name, PodValue::int(old.wrapping_add(delta)));
        let tampered = Pod::from_serialized(serialized).unwrap();
        prop_assert!(!tampered.verify_signature());
    }
}
