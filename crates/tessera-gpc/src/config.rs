//! Proof configuration schema.
//!
//! A configuration is a plain JSON document naming the POD objects that take
//! part in a proof, the entries of each that are checked or revealed, and the
//! constraints binding them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use tessera_core::types::parse_int_json;

use crate::error::GpcError;
use crate::identifier::{EntryIdentifier, EntryName};

/// Root of a proof configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProofConfig {
    pub pods: BTreeMap<String, ObjectConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tuples: BTreeMap<String, TupleConfig>,
    #[serde(rename = "uniquePODs", default, skip_serializing_if = "std::ops::Not::not")]
    pub unique_pods: bool,
}

impl ProofConfig {
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

    /// Configuration of a stored entry, if the identifier names one.
    pub fn entry(&self, id: &EntryIdentifier) -> Option<&EntryConfig> {
        match &id.entry {
            EntryName::Regular(name) => self.pods.get(&id.object)?.entries.get(name),
            EntryName::Virtual(_) => None,
        }
    }

    /// Whether the identifier resolves to a configured entry, or to a
    /// virtual entry of a configured object.
    pub fn resolves(&self, id: &EntryIdentifier) -> bool {
        match &id.entry {
            EntryName::Regular(_) => self.entry(id).is_some(),
            EntryName::Virtual(_) => self.pods.contains_key(&id.object),
        }
    }
}

/// One POD object in the proof.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectConfig {
    pub entries: BTreeMap<String, EntryConfig>,
    #[serde(rename = "contentID", default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<VirtualEntryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_public_key: Option<VirtualEntryConfig>,
}

/// Identity-commitment scheme an owner entry is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerIdKind {
    /// Identity commitment, a field element.
    V3,
    /// Identity public key.
    V4,
}

/// Constraints on one stored entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntryConfig {
    #[serde(default)]
    pub is_revealed: bool,
    #[serde(rename = "isOwnerID", default, skip_serializing_if = "Option::is_none")]
    pub is_owner_id: Option<OwnerIdKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals_entry: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_equals_entry: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_range: Option<RangeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in_range: Option<RangeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than_eq: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_than: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_than_eq: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_member_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_not_member_of: Option<String>,
}

impl EntryConfig {
    pub fn has_bounds(&self) -> bool {
        self.in_range.is_some() || self.not_in_range.is_some()
    }

    /// Declared inequalities, in a fixed order.
    pub fn inequalities(&self) -> Vec<(Inequality, &EntryIdentifier)> {
        [
            (Inequality::LessThan, &self.less_than),
            (Inequality::LessThanEq, &self.less_than_eq),
            (Inequality::GreaterThan, &self.greater_than),
            (Inequality::GreaterThanEq, &self.greater_than_eq),
        ]
        .into_iter()
        .filter_map(|(op, target)| target.as_ref().map(|t| (op, t)))
        .collect()
    }

    /// Declared list memberships as `(list name, must be a member)`.
    pub fn memberships(&self) -> Vec<(&str, bool)> {
        membership_sites(&self.is_member_of, &self.is_not_member_of)
    }
}

/// Constraints allowed on `$contentID` and `$signerPublicKey`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VirtualEntryConfig {
    #[serde(default)]
    pub is_revealed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals_entry: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_equals_entry: Option<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_member_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_not_member_of: Option<String>,
}

impl VirtualEntryConfig {
    pub fn memberships(&self) -> Vec<(&str, bool)> {
        membership_sites(&self.is_member_of, &self.is_not_member_of)
    }
}

/// An ordered group of entries checked together against a list of tuples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TupleConfig {
    pub entries: Vec<EntryIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_member_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_not_member_of: Option<String>,
}

impl TupleConfig {
    pub fn arity(&self) -> usize {
        self.entries.len()
    }

    pub fn memberships(&self) -> Vec<(&str, bool)> {
        membership_sites(&self.is_member_of, &self.is_not_member_of)
    }
}

fn membership_sites<'a>(member: &'a Option<String>, not_member: &'a Option<String>) -> Vec<(&'a str, bool)> {
    let mut sites = Vec::new();
    if let Some(list) = member {
        sites.push((list.as_str(), true));
    }
    if let Some(list) = not_member {
        sites.push((list.as_str(), false));
    }
    sites
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inequality {
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
}

impl Inequality {
    pub fn holds(&self, left: i64, right: i64) -> bool {
        match self {
            Self::LessThan => left < right,
            Self::LessThanEq => left <= right,
            Self::GreaterThan => left > right,
            Self::GreaterThanEq => left >= right,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessThan => "lessThan",
            Self::LessThanEq => "lessThanEq",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanEq => "greaterThanEq",
        }
    }
}

/// Closed integer interval as written in a configuration. Bounds accept
/// JSON numbers or decimal strings and serialize as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub min: i64,
    pub max: i64,
}

impl RangeSpec {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRange {
    min: serde_json::Value,
    max: serde_json::Value,
}

impl Serialize for RangeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawRange {
            min: serde_json::Value::String(self.min.to_string()),
            max: serde_json::Value::String(self.max.to_string()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RangeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRange::deserialize(deserializer)?;
        let min = parse_int_json(&raw.min).map_err(serde::de::Error::custom)?;
        let max = parse_int_json(&raw.max).map_err(serde::de::Error::custom)?;
        Ok(Self { min, max })
    }
}
