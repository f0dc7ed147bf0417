use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Whether `name` matches the entry/object name grammar `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a POD entry, object, or tuple name.
pub fn check_name(name: &str) -> Result<(), CoreError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidName(format!(
            "{:?} must match [A-Za-z_][A-Za-z0-9_]*",
            name
        )))
    }
}

/// Entries every POD exposes for constraint purposes without storing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VirtualEntry {
    #[serde(rename = "$contentID")]
    ContentId,
    #[serde(rename = "$signerPublicKey")]
    SignerPublicKey,
}

impl VirtualEntry {
    pub const ALL: [VirtualEntry; 2] = [VirtualEntry::ContentId, VirtualEntry::SignerPublicKey];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentId => "$contentID",
            Self::SignerPublicKey => "$signerPublicKey",
        }
    }
}

impl fmt::Display for VirtualEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VirtualEntry {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "$contentID" => Ok(Self::ContentId),
            "$signerPublicKey" => Ok(Self::SignerPublicKey),
            other => Err(CoreError::InvalidName(format!(
                "unknown virtual entry {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "_", "ship", "interactionDistance", "x_1", "_private"] {
            assert!(is_valid_name(name), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "1abc", "a-b", "a.b", "$contentID", "naïve", "a b"] {
            assert!(!is_valid_name(name), "{} should be invalid", name);
            assert!(check_name(name).is_err());
        }
    }

    #[test]
    fn test_virtual_entry_parse() {
        assert_eq!("$contentID".parse::<VirtualEntry>().unwrap(), VirtualEntry::ContentId);
        assert_eq!(
            "$signerPublicKey".parse::<VirtualEntry>().unwrap(),
            VirtualEntry::SignerPublicKey
        );
        assert!("$other".parse::<VirtualEntry>().is_err());
    }

    #[test]
    fn test_virtual_entry_serde() {
        let json = serde_json::to_string(&VirtualEntry::ContentId).unwrap();
        assert_eq!(json, "\"$contentID\"");
    }
}
