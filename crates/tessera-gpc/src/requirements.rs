use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GpcError;

/// Minimal circuit capacity needed by a proof.
///
/// Increasing any field never breaks a proof the smaller vector admits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementVector {
    pub max_objects: usize,
    pub max_entries: usize,
    pub merkle_max_depth: usize,
    pub max_numeric_values: usize,
    pub max_entry_inequalities: usize,
    pub max_lists: usize,
    pub max_list_elements: usize,
    #[serde(default)]
    pub tuple_arities: BTreeMap<String, usize>,
    #[serde(rename = "includeOwnerV3", default)]
    pub include_owner_v3: bool,
    #[serde(rename = "includeOwnerV4", default)]
    pub include_owner_v4: bool,
}

impl RequirementVector {
    pub fn from_json(json: &str) -> Result<Self, GpcError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, GpcError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> Result<String, GpcError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Combine two requirement sets: field-wise maximum, owner flags OR'd.
    ///
    /// Only one side may carry tuples unless both carry the same map; one
    /// circuit instance cannot hold two tuple layouts.
    pub fn merge(&self, other: &Self) -> Result<Self, GpcError> {
        let tuple_arities = match (self.tuple_arities.is_empty(), other.tuple_arities.is_empty()) {
            (_, true) => self.tuple_arities.clone(),
            (true, false) => other.tuple_arities.clone(),
            (false, false) if self.tuple_arities == other.tuple_arities => {
                self.tuple_arities.clone()
            }
            (false, false) => {
                return Err(GpcError::TupleConflict(format!(
                    "{:?} and {:?} cannot share one circuit",
                    self.tuple_arities, other.tuple_arities
                )))
            }
        };

        Ok(Self {
            max_objects: self.max_objects.max(other.max_objects),
            max_entries: self.max_entries.max(other.max_entries),
            merkle_max_depth: self.merkle_max_depth.max(other.merkle_max_depth),
            max_numeric_values: self.max_numeric_values.max(other.max_numeric_values),
            max_entry_inequalities: self.max_entry_inequalities.max(other.max_entry_inequalities),
            max_lists: self.max_lists.max(other.max_lists),
            max_list_elements: self.max_list_elements.max(other.max_list_elements),
            tuple_arities,
            include_owner_v3: self.include_owner_v3 || other.include_owner_v3,
            include_owner_v4: self.include_owner_v4 || other.include_owner_v4,
        })
    }

    /// Tuple arities, largest first.
    pub fn sorted_arities(&self) -> Vec<usize> {
        let mut arities: Vec<usize> = self.tuple_arities.values().copied().collect();
        arities.sort_unstable_by(|a, b| b.cmp(a));
        arities
    }
}
