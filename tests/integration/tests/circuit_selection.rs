//! Integration test: requirements derived from a validated proof drive
//! circuit selection, falling back to compilation.

use std::cell::Cell;
use std::path::Path;

use tessera_core::{PodEntries, PodValue};
use tessera_crypto::KeyPair;
use tessera_gpc::{
    check_proof_args, prepare_circuit, CatalogStore, CircuitCapacity, CircuitCatalog,
    CircuitCompiler, CircuitDescriptor, CircuitSelection, GpcError, ProofConfig, ProofInputs,
    RequirementVector,
};
use tessera_pod::Pod;

fn write_artifacts(circuit: &CircuitDescriptor, dir: &Path) {
    let paths = circuit.artifacts(dir);
    std::fs::create_dir_all(paths.wasm.parent().unwrap()).unwrap();
    for p in [&paths.wasm, &paths.proving_key, &paths.verification_key] {
        std::fs::write(p, b"artifact").unwrap();
    }
}

fn capacity(max_entries: usize) -> CircuitCapacity {
    CircuitCapacity {
        max_objects: 3,
        max_entries,
        merkle_max_depth: 8,
        max_numeric_values: 4,
        max_entry_inequalities: 2,
        max_lists: 2,
        max_list_elements: 20,
        tuple_arities: vec![2],
        include_owner_v3: false,
        include_owner_v4: false,
    }
}

fn sample_requirements() -> RequirementVector {
    let config = ProofConfig::from_json(
        r#"{"pods": {
            "a": {"entries": {"x": {"inRange": {"min": 0, "max": 10}}, "y": {"isRevealed": true}}},
            "b": {"entries": {"z": {"lessThan": "a.x", "inRange": {"min": 0, "max": 10}}}}
        }}"#,
    )
    .unwrap();
    let sign = |pairs: &[(&str, i64)], seed: u8| {
        let entries: PodEntries = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PodValue::int(*v)))
            .collect();
        Pod::sign(entries, &KeyPair::from_seed(&[seed; 32])).unwrap()
    };
    let mut inputs = ProofInputs::default();
    inputs.pods.insert("a".into(), sign(&[("x", 5), ("y", 1)], 1));
    inputs.pods.insert("b".into(), sign(&[("z", 2)], 2));
    check_proof_args(&config, &inputs).unwrap()
}

#[test]
fn test_smallest_available_circuit_wins() {
    let dir = tempfile::tempdir().unwrap();
    let small = CircuitDescriptor::new(capacity(10));
    let large = CircuitDescriptor::new(capacity(50));
    write_artifacts(&small, dir.path());
    write_artifacts(&large, dir.path());

    let catalog = CircuitCatalog::new(vec![large.clone(), small.clone()]);
    let req = sample_requirements();
    assert_eq!(catalog.find_circuit(&req, dir.path()), CircuitSelection::Found(small.clone()));

    std::fs::remove_file(small.artifacts(dir.path()).proving_key).unwrap();
    assert_eq!(catalog.find_circuit(&req, dir.path()), CircuitSelection::Found(large));
}

#[test]
fn test_builtin_catalog_selection() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = CircuitCatalog::builtin();
    let req = sample_requirements();
    assert_eq!(catalog.find_circuit(&req, dir.path()), CircuitSelection::CompileNeeded);

    for circuit in catalog.circuits() {
        write_artifacts(circuit, dir.path());
    }
    let CircuitSelection::Found(chosen) = catalog.find_circuit(&req, dir.path()) else {
        panic!("a builtin circuit should fit");
    };
    assert!(chosen.capacity.satisfies(&req));
    assert_eq!(chosen.capacity.max_entries, 10);
    assert!(!chosen.capacity.include_owner_v3);
}

#[test]
fn test_owner_flags_must_match_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let mut with_owner = capacity(10);
    with_owner.include_owner_v3 = true;
    let circuit = CircuitDescriptor::new(with_owner);
    write_artifacts(&circuit, dir.path());

    let catalog = CircuitCatalog::new(vec![circuit]);
    assert_eq!(
        catalog.find_circuit(&sample_requirements(), dir.path()),
        CircuitSelection::CompileNeeded
    );
}

struct RecordingCompiler {
    calls: Cell<usize>,
}

impl CircuitCompiler for RecordingCompiler {
    fn compile(&self, capacity: &CircuitCapacity, artifacts_dir: &Path) -> Result<CircuitDescriptor, GpcError> {
        self.calls.set(self.calls.get() + 1);
        let circuit = CircuitDescriptor::new(capacity.clone());
        write_artifacts(&circuit, artifacts_dir);
        Ok(circuit)
    }
}

#[test]
fn test_compiled_circuit_is_catalogued_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(dir.path().join("catalog").join("circuits.json"));
    let compiler = RecordingCompiler { calls: Cell::new(0) };
    let req = sample_requirements();

    let compiled = prepare_circuit(&CircuitCatalog::default(), &store, &req, dir.path(), &compiler).unwrap();
    assert_eq!(compiled.circuit_id, CircuitCapacity::from(&req).circuit_id());

    let stored = store.load().unwrap();
    assert_eq!(stored.len(), 1);
    let again = prepare_circuit(&stored, &store, &req, dir.path(), &compiler).unwrap();
    assert_eq!(again, compiled);
    assert_eq!(compiler.calls.get(), 1);

    let err = store.append(compiled).unwrap_err();
    assert!(matches!(err, GpcError::Catalog(_)));
}
