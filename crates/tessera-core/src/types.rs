use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field::FieldElement;

/// Smallest value representable by a POD `int`.
pub const POD_INT_MIN: i64 = i64::MIN;
/// Largest value representable by a POD `int`.
pub const POD_INT_MAX: i64 = i64::MAX;

/// A POD's named entries, kept in canonical (name) order.
pub type PodEntries = BTreeMap<String, PodValue>;

/// Tag of a [`PodValue`]. Declaration order is the cross-type sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    String,
    Boolean,
    Bytes,
    Cryptographic,
    EddsaPubkey,
    Date,
    Null,
}

impl ValueType {
    /// Domain-separation byte mixed into every value hash.
    pub fn tag_byte(&self) -> u8 {
        match self {
            Self::Int => 0x01,
            Self::String => 0x02,
            Self::Boolean => 0x03,
            Self::Bytes => 0x04,
            Self::Cryptographic => 0x05,
            Self::EddsaPubkey => 0x06,
            Self::Date => 0x07,
            Self::Null => 0x08,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Bytes => "bytes",
            Self::Cryptographic => "cryptographic",
            Self::EddsaPubkey => "eddsa_pubkey",
            Self::Date => "date",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed POD value.
///
/// The derived ordering compares the tag first (in [`ValueType`] order) and
/// then the payload, which gives the total order used for sorting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPodValue", into = "RawPodValue")]
pub enum PodValue {
    /// Signed 64-bit integer.
    Int(i64),
    /// UTF-8 string.
    String(String),
    /// Boolean.
    Boolean(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Field element in `[0, p)`.
    Cryptographic(FieldElement),
    /// Compressed Ed25519 public key (32 bytes).
    EddsaPubkey([u8; 32]),
    /// UTC timestamp with millisecond precision.
    Date(DateTime<Utc>),
    /// Explicit absence of a value.
    Null,
}

impl PodValue {
    pub fn int(value: i64) -> Self {
        Self::Int(value)
    }

    /// Construct an `int` from a wider integer, rejecting out-of-range values.
    pub fn try_int(value: i128) -> Result<Self, CoreError> {
        i64::try_from(value).map(Self::Int).map_err(|_| {
            CoreError::RangeError(format!(
                "int value {} outside [{}, {}]",
                value, POD_INT_MIN, POD_INT_MAX
            ))
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(value.into())
    }

    pub fn cryptographic(value: FieldElement) -> Self {
        Self::Cryptographic(value)
    }

    /// Construct an `eddsa_pubkey` from its base64 wire form.
    pub fn eddsa_pubkey(encoded: &str) -> Result<Self, CoreError> {
        decode_public_key(encoded).map(Self::EddsaPubkey)
    }

    /// Construct a `date`, truncating to millisecond precision.
    pub fn date(value: DateTime<Utc>) -> Result<Self, CoreError> {
        Utc.timestamp_millis_opt(value.timestamp_millis())
            .single()
            .map(Self::Date)
            .ok_or_else(|| CoreError::RangeError(format!("date {} not representable", value)))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::String(_) => ValueType::String,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Bytes(_) => ValueType::Bytes,
            Self::Cryptographic(_) => ValueType::Cryptographic,
            Self::EddsaPubkey(_) => ValueType::EddsaPubkey,
            Self::Date(_) => ValueType::Date,
            Self::Null => ValueType::Null,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_cryptographic(&self) -> Option<&FieldElement> {
        match self {
            Self::Cryptographic(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_public_key(&self) -> Option<&[u8; 32]> {
        match self {
            Self::EddsaPubkey(v) => Some(v),
            _ => None,
        }
    }

    /// Type-specific byte encoding fed to the value hash.
    pub fn canonical_payload(&self) -> Vec<u8> {
        match self {
            Self::Int(v) => v.to_be_bytes().to_vec(),
            Self::String(s) => s.as_bytes().to_vec(),
            Self::Boolean(b) => vec![u8::from(*b)],
            Self::Bytes(b) => b.clone(),
            Self::Cryptographic(fe) => fe.to_bytes_be().to_vec(),
            Self::EddsaPubkey(pk) => pk.to_vec(),
            Self::Date(d) => d.timestamp_millis().to_be_bytes().to_vec(),
            Self::Null => Vec::new(),
        }
    }
}

impl fmt::Display for PodValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::Cryptographic(fe) => write!(f, "{}", fe),
            Self::EddsaPubkey(pk) => write!(f, "{}", encode_public_key(pk)),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Base64 wire form of a public key.
pub fn encode_public_key(bytes: &[u8; 32]) -> String {
    BASE64.encode(bytes)
}

/// Decode a base64 public key, requiring exactly 32 bytes.
pub fn decode_public_key(encoded: &str) -> Result<[u8; 32], CoreError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| CoreError::TypeError(format!("invalid public key encoding: {}", e)))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CoreError::TypeError(format!("public key must be 32 bytes, got {}", len))
    })
}

/// Parse an `int` payload from JSON, accepting decimal strings and numbers.
pub fn parse_int_json(value: &serde_json::Value) -> Result<i64, CoreError> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(v)
            } else if n.is_u64() {
                Err(CoreError::RangeError(format!(
                    "int value {} outside [{}, {}]",
                    n, POD_INT_MIN, POD_INT_MAX
                )))
            } else {
                Err(CoreError::TypeError(format!("int value {} is not an integer", n)))
            }
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            let wide: i128 = trimmed.parse().map_err(|_| {
                let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    CoreError::RangeError(format!(
                        "int value {} outside [{}, {}]",
                        s, POD_INT_MIN, POD_INT_MAX
                    ))
                } else {
                    CoreError::TypeError(format!("invalid int value {:?}", s))
                }
            })?;
            PodValue::try_int(wide).map(|_| wide as i64)
        }
        other => Err(CoreError::TypeError(format!(
            "int value must be a number or decimal string, got {}",
            other
        ))),
    }
}

/// JSON wire form: `{"type": "<tag>", "value": <payload>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPodValue {
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default)]
    value: serde_json::Value,
}

impl TryFrom<RawPodValue> for PodValue {
    type Error = CoreError;

    fn try_from(raw: RawPodValue) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;

        let mismatch = |expected: &str| {
            CoreError::TypeError(format!(
                "{} value must be {}, got {}",
                raw.value_type, expected, raw.value
            ))
        };

        let value = match raw.value_type {
            ValueType::Int => parse_int_json(&raw.value).map(PodValue::Int),
            ValueType::String => match &raw.value {
                Json::String(s) => Ok(PodValue::String(s.clone())),
                _ => Err(mismatch("a string")),
            },
            ValueType::Boolean => match &raw.value {
                Json::Bool(b) => Ok(PodValue::Boolean(*b)),
                _ => Err(mismatch("a boolean")),
            },
            ValueType::Bytes => match &raw.value {
                Json::String(s) => hex::decode(s.trim_start_matches("0x"))
                    .map(PodValue::Bytes)
                    .map_err(|e| CoreError::TypeError(format!("invalid bytes hex: {}", e))),
                _ => Err(mismatch("a hex string")),
            },
            ValueType::Cryptographic => match &raw.value {
                Json::String(s) => s.parse().map(PodValue::Cryptographic),
                Json::Number(n) => n
                    .as_u64()
                    .map(|v| PodValue::Cryptographic(FieldElement::from_u64(v)))
                    .ok_or_else(|| {
                        CoreError::RangeError(format!("cryptographic value {} must be non-negative", n))
                    }),
                _ => Err(mismatch("a decimal string")),
            },
            ValueType::EddsaPubkey => match &raw.value {
                Json::String(s) => PodValue::eddsa_pubkey(s),
                _ => Err(mismatch("a base64 string")),
            },
            ValueType::Date => match &raw.value {
                Json::String(s) => DateTime::parse_from_rfc3339(s)
                    .map_err(|e| CoreError::TypeError(format!("invalid date {:?}: {}", s, e)))
                    .and_then(|d| PodValue::date(d.with_timezone(&Utc))),
                _ => Err(mismatch("an RFC 3339 string")),
            },
            ValueType::Null => match &raw.value {
                Json::Null => Ok(PodValue::Null),
                _ => Err(mismatch("null")),
            },
        }?;

        // Only the canonical spelling parses, so serialize(parse(x)) == x.
        let canonical = RawPodValue::from(value.clone()).value;
        if canonical != raw.value {
            return Err(CoreError::TypeError(format!(
                "{} value {} is not in canonical form, expected {}",
                raw.value_type, raw.value, canonical
            )));
        }
        Ok(value)
    }
}

impl From<PodValue> for RawPodValue {
    fn from(value: PodValue) -> Self {
        use serde_json::Value as Json;

        let value_type = value.value_type();
        let json = match value {
            PodValue::Int(v) => Json::String(v.to_string()),
            PodValue::String(s) => Json::String(s),
            PodValue::Boolean(b) => Json::Bool(b),
            PodValue::Bytes(b) => Json::String(hex::encode(b)),
            PodValue::Cryptographic(fe) => Json::String(fe.to_string()),
            PodValue::EddsaPubkey(pk) => Json::String(encode_public_key(&pk)),
            PodValue::Date(d) => {
                Json::String(d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            }
            PodValue::Null => Json::Null,
        };
        RawPodValue { value_type, value: json }
    }
}
