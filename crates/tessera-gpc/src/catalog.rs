//! Circuit catalog, selection, and the append-only catalog store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GpcError;
use crate::requirements::RequirementVector;

pub const WASM_FILE: &str = "circuit.wasm";
pub const PROVING_KEY_FILE: &str = "circuit-pkey.zkey";
pub const VERIFICATION_KEY_FILE: &str = "circuit-vkey.json";

/// Capacity of a compiled circuit. Tuple capacity is a list of arities,
/// largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitCapacity {
    pub max_objects: usize,
    pub max_entries: usize,
    pub merkle_max_depth: usize,
    pub max_numeric_values: usize,
    pub max_entry_inequalities: usize,
    pub max_lists: usize,
    pub max_list_elements: usize,
    #[serde(default)]
    pub tuple_arities: Vec<usize>,
    #[serde(rename = "includeOwnerV3", default)]
    pub include_owner_v3: bool,
    #[serde(rename = "includeOwnerV4", default)]
    pub include_owner_v4: bool,
}

impl From<&RequirementVector> for CircuitCapacity {
    fn from(req: &RequirementVector) -> Self {
        Self {
            max_objects: req.max_objects,
            max_entries: req.max_entries,
            merkle_max_depth: req.merkle_max_depth,
            max_numeric_values: req.max_numeric_values,
            max_entry_inequalities: req.max_entry_inequalities,
            max_lists: req.max_lists,
            max_list_elements: req.max_list_elements,
            tuple_arities: req.sorted_arities(),
            include_owner_v3: req.include_owner_v3,
            include_owner_v4: req.include_owner_v4,
        }
    }
}

impl CircuitCapacity {
    /// Whether a circuit of this capacity can run a proof needing `req`.
    ///
    /// Numeric capacities may exceed the requirement. Owner flags must match
    /// exactly. Required tuple arities, largest first, must each fit the
    /// circuit's tuple slot at the same position.
    pub fn satisfies(&self, req: &RequirementVector) -> bool {
        let numeric = req.max_objects <= self.max_objects
            && req.max_entries <= self.max_entries
            && req.merkle_max_depth <= self.merkle_max_depth
            && req.max_numeric_values <= self.max_numeric_values
            && req.max_entry_inequalities <= self.max_entry_inequalities
            && req.max_lists <= self.max_lists
            && req.max_list_elements <= self.max_list_elements;
        let owners = req.include_owner_v3 == self.include_owner_v3
            && req.include_owner_v4 == self.include_owner_v4;

        let required = req.sorted_arities();
        let mut available = self.tuple_arities.clone();
        available.sort_unstable_by(|a, b| b.cmp(a));
        let tuples = required.len() <= available.len()
            && required.iter().zip(&available).all(|(need, have)| need <= have);

        numeric && owners && tuples
    }

    /// Identifier derived from capacity, used as the artifact directory name.
    pub fn circuit_id(&self) -> String {
        let tuples = if self.tuple_arities.is_empty() {
            "0".to_string()
        } else {
            self.tuple_arities
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("_")
        };
        format!(
            "{}o-{}e-{}md-{}nv-{}ei-{}x{}l-{}t-{}ov3-{}ov4",
            self.max_objects,
            self.max_entries,
            self.merkle_max_depth,
            self.max_numeric_values,
            self.max_entry_inequalities,
            self.max_lists,
            self.max_list_elements,
            tuples,
            u8::from(self.include_owner_v3),
            u8::from(self.include_owner_v4),
        )
    }
}

/// A catalogued circuit: its identifier and capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitDescriptor {
    pub circuit_id: String,
    #[serde(flatten)]
    pub capacity: CircuitCapacity,
}

impl CircuitDescriptor {
    pub fn new(capacity: CircuitCapacity) -> Self {
        Self {
            circuit_id: capacity.circuit_id(),
            capacity,
        }
    }

    pub fn artifacts(&self, artifacts_dir: &Path) -> ArtifactPaths {
        ArtifactPaths::for_circuit(artifacts_dir, &self.circuit_id)
    }
}

/// Files a compiled circuit needs on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub wasm: PathBuf,
    pub proving_key: PathBuf,
    pub verification_key: PathBuf,
}

impl ArtifactPaths {
    pub fn for_circuit(artifacts_dir: &Path, circuit_id: &str) -> Self {
        let dir = artifacts_dir.join(circuit_id);
        Self {
            wasm: dir.join(WASM_FILE),
            proving_key: dir.join(PROVING_KEY_FILE),
            verification_key: dir.join(VERIFICATION_KEY_FILE),
        }
    }

    pub fn missing(&self) -> Vec<&Path> {
        [&self.wasm, &self.proving_key, &self.verification_key]
            .into_iter()
            .filter(|p| !p.is_file())
            .map(PathBuf::as_path)
            .collect()
    }

    pub fn all_present(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Result of looking a requirement up in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitSelection {
    Found(CircuitDescriptor),
    /// No catalogued circuit is both large enough and present on disk.
    CompileNeeded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitCatalog {
    circuits: Vec<CircuitDescriptor>,
}

/// (objects, entries, depth, numeric, inequalities, lists, list elements, tuple arities, v3, v4)
type BuiltinRow = (usize, usize, usize, usize, usize, usize, usize, &'static [usize], bool, bool);

const BUILTIN: &[BuiltinRow] = &[
    (1, 1, 5, 0, 0, 0, 0, &[], false, false),
    (1, 5, 6, 2, 1, 1, 10, &[], false, false),
    (1, 5, 6, 2, 1, 1, 10, &[], true, false),
    (1, 5, 6, 2, 1, 1, 10, &[], false, true),
    (3, 10, 8, 4, 2, 2, 20, &[2], false, false),
    (3, 10, 8, 4, 2, 2, 20, &[2], true, true),
    (3, 50, 8, 8, 4, 2, 50, &[3, 2], false, false),
    (3, 50, 8, 8, 4, 2, 50, &[3, 2], true, true),
    (10, 50, 10, 10, 6, 4, 100, &[4, 3], false, false),
    (10, 50, 10, 10, 6, 4, 100, &[4, 3], true, true),
];

impl CircuitCatalog {
    pub fn new(circuits: Vec<CircuitDescriptor>) -> Self {
        Self { circuits }
    }

    /// The circuit families shipped with the tool.
    pub fn builtin() -> Self {
        let circuits = BUILTIN
            .iter()
            .map(|&(o, e, md, nv, ei, lists, elems, tuples, v3, v4)| {
                CircuitDescriptor::new(CircuitCapacity {
                    max_objects: o,
                    max_entries: e,
                    merkle_max_depth: md,
                    max_numeric_values: nv,
                    max_entry_inequalities: ei,
                    max_lists: lists,
                    max_list_elements: elems,
                    tuple_arities: tuples.to_vec(),
                    include_owner_v3: v3,
                    include_owner_v4: v4,
                })
            })
            .collect();
        Self { circuits }
    }

    pub fn circuits(&self) -> &[CircuitDescriptor] {
        &self.circuits
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Merge `other` into this catalog. An incoming circuit replaces one
    /// with the same capacity, so recorded identifiers win over built-in ones.
    pub fn extend(&mut self, other: CircuitCatalog) {
        for circuit in other.circuits {
            match self.circuits.iter_mut().find(|c| c.capacity == circuit.capacity) {
                Some(existing) => *existing = circuit,
                None => self.circuits.push(circuit),
            }
        }
    }

    /// Smallest available circuit that satisfies `req`: fewest entries, then
    /// fewest objects. Circuits whose artifacts are missing are skipped.
    pub fn find_circuit(&self, req: &RequirementVector, artifacts_dir: &Path) -> CircuitSelection {
        let mut best: Option<&CircuitDescriptor> = None;
        for candidate in &self.circuits {
            if !candidate.capacity.satisfies(req) {
                continue;
            }
            let artifacts = candidate.artifacts(artifacts_dir);
            if !artifacts.all_present() {
                tracing::warn!(
                    circuit_id = %candidate.circuit_id,
                    missing = ?artifacts.missing(),
                    "skipping circuit with missing artifacts"
                );
                continue;
            }
            let smaller = best.map_or(true, |b| {
                (candidate.capacity.max_entries, candidate.capacity.max_objects)
                    < (b.capacity.max_entries, b.capacity.max_objects)
            });
            if smaller {
                best = Some(candidate);
            }
        }

        match best {
            Some(circuit) => {
                tracing::info!(circuit_id = %circuit.circuit_id, "circuit selected");
                CircuitSelection::Found(circuit.clone())
            }
            None => {
                tracing::info!("no catalogued circuit fits, compilation needed");
                CircuitSelection::CompileNeeded
            }
        }
    }
}

/// Catalog persisted as a JSON array. Entries are only ever appended.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored catalog. A missing file is an empty catalog.
    pub fn load(&self) -> Result<CircuitCatalog, GpcError> {
        if !self.path.exists() {
            return Ok(CircuitCatalog::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let circuits: Vec<CircuitDescriptor> = serde_json::from_str(&contents)?;
        Ok(CircuitCatalog::new(circuits))
    }

    /// Append a circuit. Rejects a capacity or identifier already stored.
    pub fn append(&self, circuit: CircuitDescriptor) -> Result<(), GpcError> {
        let mut circuits = self.load()?.circuits;
        if let Some(existing) = circuits.iter().find(|c| c.capacity == circuit.capacity) {
            return Err(GpcError::Catalog(format!(
                "capacity of {} is already catalogued as {}",
                circuit.circuit_id, existing.circuit_id
            )));
        }
        if circuits.iter().any(|c| c.circuit_id == circuit.circuit_id) {
            return Err(GpcError::Catalog(format!(
                "circuit id {} is already catalogued",
                circuit.circuit_id
            )));
        }

        tracing::info!(circuit_id = %circuit.circuit_id, path = %self.path.display(), "catalog entry added");
        circuits.push(circuit);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&circuits)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn capacity(objects: usize, entries: usize) -> CircuitCapacity {
        CircuitCapacity {
            max_objects: objects,
            max_entries: entries,
            merkle_max_depth: 8,
            max_numeric_values: 4,
            max_entry_inequalities: 2,
            max_lists: 2,
            max_list_elements: 20,
            ..Default::default()
        }
    }

    fn install_artifacts(dir: &Path, circuit: &CircuitDescriptor) {
        let paths = circuit.artifacts(dir);
        std::fs::create_dir_all(paths.wasm.parent().unwrap()).unwrap();
        for p in [&paths.wasm, &paths.proving_key, &paths.verification_key] {
            std::fs::write(p, b"artifact").unwrap();
        }
    }

    fn small_req() -> RequirementVector {
        RequirementVector {
            max_objects: 2,
            max_entries: 6,
            merkle_max_depth: 3,
            max_numeric_values: 2,
            max_entry_inequalities: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_circuit_id_format() {
        let mut cap = capacity(3, 10);
        assert_eq!(cap.circuit_id(), "3o-10e-8md-4nv-2ei-2x20l-0t-0ov3-0ov4");
        cap.tuple_arities = vec![3, 2];
        cap.include_owner_v4 = true;
        assert_eq!(cap.circuit_id(), "3o-10e-8md-4nv-2ei-2x20l-3_2t-0ov3-1ov4");
    }

    #[test]
    fn test_satisfies_numeric() {
        let cap = capacity(3, 10);
        assert!(cap.satisfies(&small_req()));
        let mut too_big = small_req();
        too_big.max_entries = 11;
        assert!(!cap.satisfies(&too_big));
    }

    #[test]
    fn test_owner_flags_must_match_exactly() {
        let mut cap = capacity(3, 10);
        cap.include_owner_v3 = true;
        assert!(!cap.satisfies(&small_req()));
        let mut req = small_req();
        req.include_owner_v3 = true;
        assert!(cap.satisfies(&req));
    }

    #[test]
    fn test_tuple_dominance() {
        let mut cap = capacity(3, 10);
        cap.tuple_arities = vec![3, 2];
        let mut req = small_req();
        req.tuple_arities = BTreeMap::from([("a".to_string(), 2), ("b".to_string(), 3)]);
        assert!(cap.satisfies(&req));
        req.tuple_arities = BTreeMap::from([("a".to_string(), 3), ("b".to_string(), 3)]);
        assert!(!cap.satisfies(&req));
        req.tuple_arities = BTreeMap::from([
            ("a".to_string(), 2),
            ("b".to_string(), 2),
            ("c".to_string(), 2),
        ]);
        assert!(!cap.satisfies(&req));
    }

    #[test]
    fn test_selects_fewest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let big = CircuitDescriptor::new(capacity(3, 50));
        let small = CircuitDescriptor::new(capacity(3, 10));
        install_artifacts(dir.path(), &big);
        install_artifacts(dir.path(), &small);

        let catalog = CircuitCatalog::new(vec![big, small.clone()]);
        assert_eq!(
            catalog.find_circuit(&small_req(), dir.path()),
            CircuitSelection::Found(small)
        );
    }

    #[test]
    fn test_ties_broken_by_objects() {
        let dir = tempfile::tempdir().unwrap();
        let wide = CircuitDescriptor::new(capacity(5, 10));
        let narrow = CircuitDescriptor::new(capacity(2, 10));
        install_artifacts(dir.path(), &wide);
        install_artifacts(dir.path(), &narrow);
        let catalog = CircuitCatalog::new(vec![wide, narrow.clone()]);
        assert_eq!(
            catalog.find_circuit(&small_req(), dir.path()),
            CircuitSelection::Found(narrow)
        );
    }

    #[test]
    fn test_missing_artifacts_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let big = CircuitDescriptor::new(capacity(3, 50));
        let small = CircuitDescriptor::new(capacity(3, 10));
        install_artifacts(dir.path(), &big);
        let catalog = CircuitCatalog::new(vec![big.clone(), small]);
        assert_eq!(
            catalog.find_circuit(&small_req(), dir.path()),
            CircuitSelection::Found(big)
        );
    }

    #[test]
    fn test_compile_needed() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CircuitCatalog::builtin();
        assert_eq!(
            catalog.find_circuit(&small_req(), dir.path()),
            CircuitSelection::CompileNeeded
        );
    }

    #[test]
    fn test_builtin_ids_unique() {
        let catalog = CircuitCatalog::builtin();
        let mut ids: Vec<_> = catalog.circuits().iter().map(|c| c.circuit_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_descriptor_json_is_flat() {
        let json = serde_json::to_value(CircuitDescriptor::new(capacity(1, 1))).unwrap();
        assert!(json.get("circuitId").is_some());
        assert_eq!(json.get("maxEntries").and_then(|v| v.as_u64()), Some(1));
    }

    #[test]
    fn test_store_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("nested").join("catalog.json"));
        assert!(store.load().unwrap().is_empty());

        let first = CircuitDescriptor::new(capacity(1, 5));
        store.append(first.clone()).unwrap();
        store.append(CircuitDescriptor::new(capacity(2, 5))).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.circuits()[0], first);

        let err = store.append(first).unwrap_err();
        assert!(matches!(err, GpcError::Catalog(_)));
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_extend_prefers_recorded_id() {
        let dir = tempfile::tempdir().unwrap();
        let builtin = CircuitCatalog::builtin();
        let shadowed = builtin.circuits()[1].clone();
        let mut recorded = shadowed.clone();
        recorded.circuit_id = "custom-small".into();
        install_artifacts(dir.path(), &recorded);

        let mut catalog = builtin.clone();
        catalog.extend(CircuitCatalog::new(vec![recorded.clone()]));
        assert_eq!(catalog.len(), builtin.len());
        assert!(catalog.circuits().contains(&recorded));
        assert!(!catalog.circuits().iter().any(|c| c.circuit_id == shadowed.circuit_id));

        let req = RequirementVector {
            max_objects: 1,
            max_entries: 5,
            merkle_max_depth: 6,
            ..Default::default()
        };
        assert_eq!(catalog.find_circuit(&req, dir.path()), CircuitSelection::Found(recorded));
    }

    #[test]
    fn test_extend_skips_duplicates() {
        let mut catalog = CircuitCatalog::builtin();
        let before = catalog.len();
        catalog.extend(CircuitCatalog::builtin());
        assert_eq!(catalog.len(), before);
        catalog.extend(CircuitCatalog::new(vec![CircuitDescriptor::new(capacity(7, 7))]));
        assert_eq!(catalog.len(), before + 1);
    }
}
