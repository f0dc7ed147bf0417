//! Integration test: proof configuration documents checked against
//! honestly signed PODs, and tampering detection.

use tessera_core::{ErrorKind, FieldElement, PodEntries, PodValue};
use tessera_crypto::KeyPair;
use tessera_gpc::{
    check_config, check_inputs_against_config, check_proof_args, compile_revealed_claims,
    GpcError, OwnerInput, ProofConfig, ProofInputs,
};
use tessera_pod::Pod;

const SHIP_CONFIG: &str = r#"{
    "pods": {
        "ship": {
            "entries": {
                "interactionDistance": {
                    "isRevealed": true,
                    "inRange": { "min": "0", "max": "9223372036854775807" }
                }
            }
        },
        "distance": {
            "entries": {
                "distanceSquaredMeters": {
                    "inRange": { "min": "0", "max": "9223372036854775807" },
                    "lessThanEq": "ship.interactionDistance"
                }
            }
        }
    }
}"#;

fn pod(entries: &[(&str, PodValue)], seed: u8) -> Pod {
    let entries: PodEntries = entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Pod::sign(entries, &KeyPair::from_seed(&[seed; 32])).unwrap()
}

fn ship_inputs(distance_squared: i64) -> ProofInputs {
    let mut inputs = ProofInputs::default();
    inputs.pods.insert(
        "ship".into(),
        pod(&[("interactionDistance", PodValue::int(25)), ("name", PodValue::string("Rocinante"))], 1),
    );
    inputs.pods.insert(
        "distance".into(),
        pod(&[("distanceSquaredMeters", PodValue::int(distance_squared))], 2),
    );
    inputs
}

/// Inputs travel as JSON documents; exercise that path too.
fn through_json(inputs: &ProofInputs) -> ProofInputs {
    let json = serde_json::to_string(&inputs.serialize()).unwrap();
    ProofInputs::from_json(&json).unwrap()
}

#[test]
fn test_ship_within_range_validates() {
    let config = ProofConfig::from_json(SHIP_CONFIG).unwrap();
    let req = check_proof_args(&config, &through_json(&ship_inputs(16))).unwrap();
    assert_eq!(req.max_objects, 2);
    assert_eq!(req.max_entries, 2);
    assert_eq!(req.max_numeric_values, 2);
    assert_eq!(req.max_entry_inequalities, 1);
    assert_eq!(req.merkle_max_depth, 1);
}

#[test]
fn test_ship_out_of_range_rejected() {
    let config = ProofConfig::from_json(SHIP_CONFIG).unwrap();
    let err = check_proof_args(&config, &ship_inputs(36)).unwrap_err();
    assert!(matches!(err, GpcError::ConstraintViolation(_)), "{}", err);
}

#[test]
fn test_revealed_ship_distance() {
    let config = ProofConfig::from_json(SHIP_CONFIG).unwrap();
    let claims = compile_revealed_claims(&config, &ship_inputs(16)).unwrap();
    assert_eq!(claims.pods["ship"].entries["interactionDistance"], PodValue::int(25));
    assert!(claims.pods["distance"].entries.is_empty());
    assert!(!claims.pods["ship"].entries.contains_key("name"));
}

#[test]
fn test_tampered_range_value_is_range_error() {
    let config = ProofConfig::from_json(
        r#"{"pods": {"badge": {"entries": {"level": {"inRange": {"min": 1, "max": 10}}}}}}"#,
    )
    .unwrap();
    check_config(&config).unwrap();

    let mut inputs = ProofInputs::default();
    inputs.pods.insert("badge".into(), pod(&[("level", PodValue::int(5))], 1));
    check_inputs_against_config(&config, &inputs).unwrap();

    inputs.pods.insert("badge".into(), pod(&[("level", PodValue::int(11))], 1));
    let err = check_inputs_against_config(&config, &inputs).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn test_changed_owner_commitment_rejected() {
    let config = ProofConfig::from_json(
        r#"{"pods": {"ticket": {"entries": {
            "attendee": {"isOwnerID": "V3"},
            "eventId": {"isRevealed": true}
        }}}}"#,
    )
    .unwrap();
    let commitment = FieldElement::from_u64(0xC0FFEE);
    let mut inputs = ProofInputs::default();
    inputs.pods.insert(
        "ticket".into(),
        pod(
            &[
                ("attendee", PodValue::cryptographic(commitment.clone())),
                ("eventId", PodValue::string("devcon")),
            ],
            9,
        ),
    );
    inputs.owner = Some(OwnerInput {
        identity_v3: Some(commitment),
        external_nullifier: Some(PodValue::string("vote-1")),
        ..Default::default()
    });

    let req = check_proof_args(&config, &through_json(&inputs)).unwrap();
    assert!(req.include_owner_v3);
    assert!(!req.include_owner_v4);

    inputs.owner.as_mut().unwrap().identity_v3 = Some(FieldElement::from_u64(0xBADBAD));
    assert!(check_inputs_against_config(&config, &inputs).is_err());
}

#[test]
fn test_canonicalization_through_documents() {
    let contradiction = ProofConfig::from_json(
        r#"{"pods": {"a": {"entries": {"x": {
            "inRange": {"min": 0, "max": 10},
            "notInRange": {"min": 0, "max": 10}
        }}}}}"#,
    )
    .unwrap();
    assert!(check_config(&contradiction).is_err());

    let split = ProofConfig::from_json(
        r#"{"pods": {"a": {"entries": {"x": {
            "inRange": {"min": 0, "max": 100},
            "notInRange": {"min": 40, "max": 60}
        }}}}}"#,
    )
    .unwrap();
    let req = check_config(&split).unwrap();
    assert_eq!(req.max_numeric_values, 1);

    let check = |v: i64| {
        let mut inputs = ProofInputs::default();
        inputs.pods.insert("a".into(), pod(&[("x", PodValue::int(v))], 1));
        check_inputs_against_config(&split, &inputs)
    };
    assert!(check(0).is_ok());
    assert!(check(39).is_ok());
    assert!(check(40).is_err());
    assert!(check(61).is_ok());
    assert!(check(101).is_err());
}

#[test]
fn test_membership_documents() {
    let config = ProofConfig::from_json(
        r#"{
            "pods": {"ship": {"entries": {
                "class": {"isMemberOf": "allowed"},
                "captain": {},
                "faction": {}
            }}},
            "tuples": {"command": {
                "entries": ["ship.captain", "ship.faction"],
                "isNotMemberOf": "wanted"
            }}
        }"#,
    )
    .unwrap();
    let inputs_json = |captain: &str| {
        let ship = pod(
            &[
                ("class", PodValue::string("frigate")),
                ("captain", PodValue::string(captain)),
                ("faction", PodValue::string("belt")),
            ],
            3,
        );
        serde_json::json!({
            "pods": { "ship": ship.serialize() },
            "membershipLists": {
                "allowed": [
                    {"type": "string", "value": "frigate"},
                    {"type": "string", "value": "corvette"}
                ],
                "wanted": [
                    [{"type": "string", "value": "Ashford"}, {"type": "string", "value": "belt"}]
                ]
            }
        })
        .to_string()
    };

    let ok = ProofInputs::from_json(&inputs_json("Holden")).unwrap();
    let req = check_proof_args(&config, &ok).unwrap();
    assert_eq!(req.max_lists, 2);
    assert_eq!(req.max_list_elements, 2);
    assert_eq!(req.tuple_arities.get("command"), Some(&2));

    let wanted = ProofInputs::from_json(&inputs_json("Ashford")).unwrap();
    assert!(check_proof_args(&config, &wanted).is_err());
}

#[test]
fn test_honest_inputs_never_fail() {
    // Every constraint kind at once, all satisfiable by the PODs below.
    let kp = KeyPair::from_seed(&[8u8; 32]);
    let owner_key = KeyPair::from_seed(&[9u8; 32]).public_key();
    let config = ProofConfig::from_json(
        r#"{
            "pods": {
                "a": {
                    "entries": {
                        "n": {"inRange": {"min": 0, "max": 100}, "greaterThan": "b.m"},
                        "tag": {"equalsEntry": "b.tag", "isRevealed": true},
                        "owner": {"isOwnerID": "V4"}
                    },
                    "signerPublicKey": {"equalsEntry": "b.$signerPublicKey"}
                },
                "b": {
                    "entries": {
                        "m": {"notInRange": {"min": 50, "max": 60}},
                        "tag": {"isNotMemberOf": "banned"}
                    },
                    "contentID": {"isRevealed": true}
                }
            },
            "uniquePODs": true
        }"#,
    )
    .unwrap();

    let a: PodEntries = [
        ("n".to_string(), PodValue::int(42)),
        ("tag".to_string(), PodValue::string("ok")),
        ("owner".to_string(), PodValue::EddsaPubkey(*owner_key.as_bytes())),
    ]
    .into_iter()
    .collect();
    let b: PodEntries = [
        ("m".to_string(), PodValue::int(10)),
        ("tag".to_string(), PodValue::string("ok")),
    ]
    .into_iter()
    .collect();

    let mut inputs = ProofInputs::default();
    inputs.pods.insert("a".into(), Pod::sign(a, &kp).unwrap());
    inputs.pods.insert("b".into(), Pod::sign(b, &kp).unwrap());
    inputs.owner = Some(OwnerInput {
        identity_v4: Some(*owner_key.as_bytes()),
        ..Default::default()
    });
    inputs.membership_lists.insert(
        "banned".into(),
        vec![tessera_gpc::ListElement::Value(PodValue::string("bad"))],
    );

    let req = check_proof_args(&config, &through_json(&inputs)).unwrap();
    assert!(req.include_owner_v4);
    assert_eq!(req.max_entry_inequalities, 1);
    assert_eq!(req.max_numeric_values, 2);

    let claims = compile_revealed_claims(&config, &inputs).unwrap();
    assert_eq!(claims.pods["b"].content_id.as_ref(), Some(inputs.pods["b"].content_id()));
}
