use tessera_core::{FieldElement, PodValue};

/// Hashes in the POD content model are field elements.
pub type Hash = FieldElement;

const NAME_TAG: u8 = 0x10;
const PAIR_TAG: u8 = 0x20;
const TUPLE_TAG: u8 = 0x30;

/// BLAKE3 over `tag || data`, reduced into the scalar field.
fn tagged_hash(tag: u8, data: &[u8]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[tag]);
    hasher.update(data);
    FieldElement::from_bytes_reduced(hasher.finalize().as_bytes())
}

/// Hash a typed value. The type tag is mixed in, so equal payloads of
/// different types never collide.
pub fn hash_value(value: &PodValue) -> Hash {
    tagged_hash(value.value_type().tag_byte(), &value.canonical_payload())
}

/// Hash an entry name.
pub fn hash_name(name: &str) -> Hash {
    tagged_hash(NAME_TAG, name.as_bytes())
}

/// Hash two child nodes into their parent.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut input = Vec::with_capacity(64);
    input.extend_from_slice(&left.to_bytes_be());
    input.extend_from_slice(&right.to_bytes_be());
    tagged_hash(PAIR_TAG, &input)
}

/// Hash an ordered tuple of values by folding over the element hashes.
pub fn hash_tuple(values: &[PodValue]) -> Hash {
    let mut input = Vec::with_capacity(8 + values.len() * 32);
    input.extend_from_slice(&(values.len() as u64).to_be_bytes());
    for value in values {
        input.extend_from_slice(&hash_value(value).to_bytes_be());
    }
    tagged_hash(TUPLE_TAG, &input)
}
