//! ABI-style typed encoding for external commitments.
//!
//! Values are encoded with the usual head/tail layout: static values take one
//! or more 32-byte words in place, dynamic values (`bytes`, `string`, `T[]`)
//! leave a byte offset in the head and append their data after all heads.

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use tessera_core::types::encode_public_key;
use tessera_core::PodValue;

use crate::error::PodError;

const WORD: usize = 32;

/// Encoding descriptor assigned to a POD entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Bool,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8).
    Uint(u16),
    /// Signed integer of the given bit width (8..=256, multiple of 8).
    Int(u16),
    Address,
    Bytes32,
    Bytes,
    String,
    /// `T[]` when the length is `None`, `T[k]` otherwise.
    Array(Box<AbiType>, Option<usize>),
}

impl AbiType {
    /// Whether values of this type live in the tail section.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_, None) => true,
            Self::Array(inner, Some(_)) => inner.is_dynamic(),
            _ => false,
        }
    }

    /// Head size in bytes.
    fn head_size(&self) -> usize {
        match self {
            Self::Array(inner, Some(len)) if !inner.is_dynamic() => inner.head_size() * len,
            _ => WORD,
        }
    }

    /// The value an absent or null entry encodes as.
    pub fn zero_value(&self) -> AbiValue {
        match self {
            Self::Bool => AbiValue::Bool(false),
            Self::Uint(_) | Self::Int(_) => AbiValue::Int(BigInt::from(0)),
            Self::Address => AbiValue::Address([0u8; 20]),
            Self::Bytes32 => AbiValue::Bytes32([0u8; 32]),
            Self::Bytes => AbiValue::Bytes(Vec::new()),
            Self::String => AbiValue::String(String::new()),
            Self::Array(_, None) => AbiValue::Array(Vec::new()),
            Self::Array(inner, Some(len)) => {
                AbiValue::Array((0..*len).map(|_| inner.zero_value()).collect())
            }
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Uint(bits) => write!(f, "uint{}", bits),
            Self::Int(bits) => write!(f, "int{}", bits),
            Self::Address => write!(f, "address"),
            Self::Bytes32 => write!(f, "bytes32"),
            Self::Bytes => write!(f, "bytes"),
            Self::String => write!(f, "string"),
            Self::Array(inner, None) => write!(f, "{}[]", inner),
            Self::Array(inner, Some(len)) => write!(f, "{}[{}]", inner, len),
        }
    }
}

fn parse_bits(digits: &str, original: &str) -> Result<u16, String> {
    if digits.is_empty() {
        return Ok(256);
    }
    let bits: u16 = digits
        .parse()
        .map_err(|_| format!("invalid integer width in {:?}", original))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(format!("integer width must be a multiple of 8 in 8..=256: {:?}", original));
    }
    Ok(bits)
}

impl FromStr for AbiType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(prefix) = s.strip_suffix(']') {
            let open = prefix
                .rfind('[')
                .ok_or_else(|| format!("unbalanced array brackets in {:?}", s))?;
            let inner: AbiType = prefix[..open].parse()?;
            let len_str = &prefix[open + 1..];
            let len = if len_str.is_empty() {
                None
            } else {
                Some(
                    len_str
                        .parse::<usize>()
                        .map_err(|_| format!("invalid array length in {:?}", s))?,
                )
            };
            return Ok(Self::Array(Box::new(inner), len));
        }

        match s {
            "bool" => Ok(Self::Bool),
            "address" => Ok(Self::Address),
            "bytes32" => Ok(Self::Bytes32),
            "bytes" => Ok(Self::Bytes),
            "string" => Ok(Self::String),
            _ => {
                if let Some(digits) = s.strip_prefix("uint") {
                    Ok(Self::Uint(parse_bits(digits, s)?))
                } else if let Some(digits) = s.strip_prefix("int") {
                    Ok(Self::Int(parse_bits(digits, s)?))
                } else {
                    Err(format!("unsupported encoding type {:?}", s))
                }
            }
        }
    }
}

impl Serialize for AbiType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AbiType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A value ready for encoding. Integers of either signedness share one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Bool(bool),
    Int(BigInt),
    Address([u8; 20]),
    Bytes32([u8; 32]),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
}

fn int_word(value: &BigInt) -> [u8; WORD] {
    let fill = if value.sign() == Sign::Minus { 0xFF } else { 0x00 };
    let mut word = [fill; WORD];
    let bytes = value.to_signed_bytes_be();
    let start = WORD.saturating_sub(bytes.len());
    word[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(WORD)..]);
    word
}

fn usize_word(value: usize) -> [u8; WORD] {
    int_word(&BigInt::from(value))
}

fn padded(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    let rem = out.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + WORD - rem, 0);
    }
    out
}

/// Encode a sequence of values as a tuple.
pub fn abi_encode(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, String> {
    if types.len() != values.len() {
        return Err(format!(
            "expected {} values, got {}",
            types.len(),
            values.len()
        ));
    }

    let head_len: usize = types.iter().map(AbiType::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for (ty, value) in types.iter().zip(values) {
        let encoded = encode_single(ty, value)?;
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend_from_slice(&encoded);
        } else {
            head.extend_from_slice(&encoded);
        }
    }
    head.extend_from_slice(&tail);
    Ok(head)
}

fn encode_single(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, String> {
    match (ty, value) {
        (AbiType::Bool, AbiValue::Bool(b)) => Ok(usize_word(usize::from(*b)).to_vec()),
        (AbiType::Uint(_) | AbiType::Int(_), AbiValue::Int(v)) => Ok(int_word(v).to_vec()),
        (AbiType::Address, AbiValue::Address(addr)) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(addr);
            Ok(word.to_vec())
        }
        (AbiType::Bytes32, AbiValue::Bytes32(b)) => Ok(b.to_vec()),
        (AbiType::Bytes, AbiValue::Bytes(data)) => {
            let mut out = usize_word(data.len()).to_vec();
            out.extend(padded(data));
            Ok(out)
        }
        (AbiType::String, AbiValue::String(s)) => {
            let mut out = usize_word(s.len()).to_vec();
            out.extend(padded(s.as_bytes()));
            Ok(out)
        }
        (AbiType::Array(inner, len), AbiValue::Array(items)) => {
            if let Some(len) = len {
                if items.len() != *len {
                    return Err(format!("expected {} elements, got {}", len, items.len()));
                }
            }
            let types = vec![inner.as_ref().clone(); items.len()];
            let body = abi_encode(&types, items)?;
            if len.is_some() {
                Ok(body)
            } else {
                let mut out = usize_word(items.len()).to_vec();
                out.extend(body);
                Ok(out)
            }
        }
        (ty, value) => Err(format!("value {:?} does not match type {}", value, ty)),
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits = s.trim().trim_start_matches("0x");
    hex::decode(digits).map_err(|e| format!("malformed hex {:?}: {}", s, e))
}

fn fixed_hex<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = decode_hex(s)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected {} bytes, got {}", N, bytes.len()))
}

/// Outcome of a failed conversion, split so callers can map ranges and
/// shapes to different error kinds.
enum ConvertError {
    Shape(String),
    Range(String),
}

fn check_int_range(ty: &AbiType, value: BigInt) -> Result<AbiValue, ConvertError> {
    let in_range = match ty {
        AbiType::Uint(bits) => {
            value.sign() != Sign::Minus && value.bits() <= u64::from(*bits)
        }
        AbiType::Int(bits) => {
            let bound = BigInt::from(1) << (usize::from(*bits) - 1);
            value >= -bound.clone() && value < bound
        }
        _ => false,
    };
    if in_range {
        Ok(AbiValue::Int(value))
    } else {
        Err(ConvertError::Range(format!("{} does not fit in {}", value, ty)))
    }
}

fn convert_pod_value(value: &PodValue, ty: &AbiType) -> Result<AbiValue, ConvertError> {
    let shape = |reason: &str| ConvertError::Shape(reason.to_string());
    match (ty, value) {
        (_, PodValue::Null) => Ok(ty.zero_value()),
        (AbiType::Array(_, _), PodValue::String(list)) => {
            let parsed: serde_json::Value = serde_json::from_str(list)
                .map_err(|e| ConvertError::Shape(format!("array payload is not JSON: {}", e)))?;
            convert_json(&parsed, ty)
        }
        (AbiType::Array(_, _), _) => Err(shape("arrays must be a string holding a JSON list")),
        (AbiType::Bool, PodValue::Boolean(b)) => Ok(AbiValue::Bool(*b)),
        (AbiType::Uint(_) | AbiType::Int(_), PodValue::Int(i)) => {
            check_int_range(ty, BigInt::from(*i))
        }
        (AbiType::Uint(_) | AbiType::Int(_), PodValue::Cryptographic(fe)) => {
            check_int_range(ty, BigInt::from(fe.as_biguint().clone()))
        }
        (AbiType::Uint(_) | AbiType::Int(_), PodValue::Date(date)) => {
            check_int_range(ty, BigInt::from(date.timestamp_millis()))
        }
        (AbiType::Address, PodValue::String(s)) => {
            fixed_hex::<20>(s).map(AbiValue::Address).map_err(ConvertError::Shape)
        }
        (AbiType::Address, PodValue::Bytes(b)) => b
            .as_slice()
            .try_into()
            .map(AbiValue::Address)
            .map_err(|_| ConvertError::Shape(format!("expected 20 bytes, got {}", b.len()))),
        (AbiType::Bytes32, PodValue::String(s)) => {
            fixed_hex::<32>(s).map(AbiValue::Bytes32).map_err(ConvertError::Shape)
        }
        (AbiType::Bytes32, PodValue::Bytes(b)) => b
            .as_slice()
            .try_into()
            .map(AbiValue::Bytes32)
            .map_err(|_| ConvertError::Shape(format!("expected 32 bytes, got {}", b.len()))),
        (AbiType::Bytes32, PodValue::Cryptographic(fe)) => Ok(AbiValue::Bytes32(fe.to_bytes_be())),
        (AbiType::Bytes32, PodValue::EddsaPubkey(pk)) => Ok(AbiValue::Bytes32(*pk)),
        (AbiType::Bytes, PodValue::Bytes(b)) => Ok(AbiValue::Bytes(b.clone())),
        (AbiType::Bytes, PodValue::String(s)) => {
            decode_hex(s).map(AbiValue::Bytes).map_err(ConvertError::Shape)
        }
        (AbiType::String, PodValue::String(s)) => Ok(AbiValue::String(s.clone())),
        (AbiType::String, PodValue::EddsaPubkey(pk)) => {
            Ok(AbiValue::String(encode_public_key(pk)))
        }
        (ty, value) => Err(ConvertError::Shape(format!(
            "{} value cannot be encoded as {}",
            value.value_type(),
            ty
        ))),
    }
}

fn convert_json(value: &serde_json::Value, ty: &AbiType) -> Result<AbiValue, ConvertError> {
    use serde_json::Value;

    match (ty, value) {
        (AbiType::Array(inner, len), Value::Array(items)) => {
            if let Some(len) = len {
                if items.len() != *len {
                    return Err(ConvertError::Shape(format!(
                        "expected {} elements, got {}",
                        len,
                        items.len()
                    )));
                }
            }
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    convert_json(item, inner).map_err(|e| match e {
                        ConvertError::Shape(r) => ConvertError::Shape(format!("element {}: {}", i, r)),
                        ConvertError::Range(r) => ConvertError::Range(format!("element {}: {}", i, r)),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(AbiValue::Array)
        }
        (AbiType::Bool, Value::Bool(b)) => Ok(AbiValue::Bool(*b)),
        (AbiType::Uint(_) | AbiType::Int(_), Value::Number(n)) => {
            let parsed = n
                .as_i64()
                .map(BigInt::from)
                .or_else(|| n.as_u64().map(BigInt::from))
                .ok_or_else(|| ConvertError::Shape(format!("{} is not an integer", n)))?;
            check_int_range(ty, parsed)
        }
        (AbiType::Uint(_) | AbiType::Int(_), Value::String(s)) => {
            let parsed = s
                .trim()
                .parse::<BigInt>()
                .map_err(|_| ConvertError::Shape(format!("{:?} is not an integer", s)))?;
            check_int_range(ty, parsed)
        }
        (AbiType::Address, Value::String(s)) => {
            fixed_hex::<20>(s).map(AbiValue::Address).map_err(ConvertError::Shape)
        }
        (AbiType::Bytes32, Value::String(s)) => {
            fixed_hex::<32>(s).map(AbiValue::Bytes32).map_err(ConvertError::Shape)
        }
        (AbiType::Bytes, Value::String(s)) => {
            decode_hex(s).map(AbiValue::Bytes).map_err(ConvertError::Shape)
        }
        (AbiType::String, Value::String(s)) => Ok(AbiValue::String(s.clone())),
        (ty, value) => Err(ConvertError::Shape(format!(
            "element {} does not match {}",
            value, ty
        ))),
    }
}

/// Convert a POD value into the value its declared encoding expects.
///
/// Arrays are carried as a `string` POD value holding a JSON list. Dates
/// become integer milliseconds. Null becomes the encoding's zero value.
pub fn to_abi_value(entry: &str, value: &PodValue, ty: &AbiType) -> Result<AbiValue, PodError> {
    convert_pod_value(value, ty).map_err(|e| match e {
        ConvertError::Shape(reason) => PodError::Encoding {
            entry: entry.to_string(),
            abi_type: ty.to_string(),
            reason,
        },
        ConvertError::Range(reason) => PodError::EncodingRange {
            entry: entry.to_string(),
            reason,
        },
    })
}
