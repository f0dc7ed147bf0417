use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Decimal form of the BN254 scalar field modulus.
pub const FIELD_MODULUS_DEC: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Big-endian bytes of the modulus.
const FIELD_MODULUS_BE: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| BigUint::from_bytes_be(&FIELD_MODULUS_BE))
}

/// An element of the BN254 scalar field, always in `[0, p)`.
///
/// Used for `cryptographic` POD values, value hashes, and content IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// The field modulus `p`.
    pub fn modulus() -> &'static BigUint {
        modulus()
    }

    /// Wrap an integer, rejecting values `>= p`.
    pub fn new(value: BigUint) -> Result<Self, CoreError> {
        if &value >= modulus() {
            return Err(CoreError::RangeError(format!(
                "cryptographic value {} is not less than the field modulus",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Interpret big-endian bytes as an integer and reduce it modulo `p`.
    pub fn from_bytes_reduced(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes) % modulus())
    }

    pub fn zero() -> Self {
        Self(BigUint::from(0u8))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    /// The underlying integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Fixed-width 32-byte big-endian encoding.
    pub fn to_bytes_be(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - raw.len()..].copy_from_slice(&raw);
        out
    }

    /// `0x`-prefixed, zero-padded hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes_be()))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FieldElement {
    type Err = CoreError;

    /// Parse a decimal string, or hex with a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if let Some(hex_digits) = trimmed.strip_prefix("0x") {
            BigUint::parse_bytes(hex_digits.as_bytes(), 16)
        } else {
            BigUint::parse_bytes(trimmed.as_bytes(), 10)
        };
        let value = parsed.ok_or_else(|| {
            CoreError::TypeError(format!("invalid cryptographic value: {:?}", s))
        })?;
        Self::new(value)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::String(s) => s.parse().map_err(serde::de::Error::custom),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(Self::from_u64)
                .ok_or_else(|| serde::de::Error::custom("cryptographic value must be non-negative")),
            other => Err(serde::de::Error::custom(format!(
                "expected cryptographic value as string, got {}",
                other
            ))),
        }
    }
}
