use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use tessera_core::{check_name, VirtualEntry};

use crate::error::GpcError;

/// Entry part of an identifier: a stored entry or one of the virtual ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryName {
    Regular(String),
    Virtual(VirtualEntry),
}

impl EntryName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Regular(name) => name,
            Self::Virtual(v) => v.as_str(),
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `object.entry` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryIdentifier {
    pub object: String,
    pub entry: EntryName,
}

impl EntryIdentifier {
    pub fn new(object: impl Into<String>, entry: impl Into<String>) -> Result<Self, GpcError> {
        let object = object.into();
        let entry = entry.into();
        check_name(&object)?;
        let entry = if entry.starts_with('$') {
            EntryName::Virtual(entry.parse()?)
        } else {
            check_name(&entry)?;
            EntryName::Regular(entry)
        };
        Ok(Self { object, entry })
    }

    pub fn is_virtual(&self) -> bool {
        self.entry.is_virtual()
    }
}

impl fmt::Display for EntryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.entry)
    }
}

impl FromStr for EntryIdentifier {
    type Err = GpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (object, entry) = s.split_once('.').ok_or_else(|| {
            GpcError::TypeError(format!("entry identifier {:?} must be object.entry", s))
        })?;
        Self::new(object, entry)
    }
}

impl Serialize for EntryIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
