//! Component C: the SCALE codec split between static and metadata-driven
//! dynamic encoding/decoding.
//!
//! Mirrors `subxt`'s `metadata/{decode,encode}_with_metadata.rs` split: types
//! whose shape is known at compile time go through `parity-scale-codec`
//! directly; anything whose shape is resolved against live metadata (storage
//! values, runtime API returns, call arguments, dispatch errors) goes through
//! `scale_value::scale::{decode_as_type, encode_as_type}`, which drive
//! `scale-decode`/`scale-encode` against a `scale_info::PortableRegistry`.

use codec::{Decode, Encode};
use scale_value::Value;

use crate::error::Error;
use crate::metadata::Metadata;

/// A dynamically-typed value annotated with the type id used to decode it.
pub type DecodedValue = Value<scale_value::scale::TypeId>;

/// Decode `bytes` as the portable type `type_id`, consulting `metadata`'s registry.
pub fn decode_value(bytes: &mut &[u8], type_id: u32, metadata: &Metadata) -> Result<DecodedValue, Error> {
    let value = scale_value::scale::decode_as_type(bytes, type_id, metadata.types())?;
    Ok(value)
}

/// Encode `value` as the portable type `type_id`, consulting `metadata`'s registry.
pub fn encode_value(value: &Value<()>, type_id: u32, metadata: &Metadata, out: &mut Vec<u8>) -> Result<(), Error> {
    scale_value::scale::encode_as_type(value, type_id, metadata.types(), out)?;
    Ok(())
}

/// Any statically-known SCALE type, decoded with no metadata consultation.
pub fn decode_static<T: Decode>(bytes: &mut &[u8]) -> Result<T, Error> {
    T::decode(bytes).map_err(Error::from)
}

/// Any statically-known SCALE type, encoded with no metadata consultation.
pub fn encode_static<T: Encode>(value: &T) -> Vec<u8> {
    value.encode()
}

/// Field values of a decoded composite (struct- or tuple-shaped) value, in
/// declaration order, regardless of whether the fields are named.
pub(crate) fn composite_values<T>(c: &scale_value::Composite<T>) -> Vec<&Value<T>> {
    match c {
        scale_value::Composite::Named(fields) => fields.iter().map(|(_, v)| v).collect(),
        scale_value::Composite::Unnamed(vals) => vals.iter().collect(),
    }
}

/// The composite payload of `value`, if it's a variant (enum case).
pub(crate) fn variant_composite<T>(value: &Value<T>) -> Option<&scale_value::Composite<T>> {
    match &value.value {
        scale_value::ValueDef::Variant(v) => Some(&v.values),
        _ => None,
    }
}

/// The variant name of `value`, if it's a variant (enum case).
pub(crate) fn variant_name<T>(value: &Value<T>) -> Option<&str> {
    match &value.value {
        scale_value::ValueDef::Variant(v) => Some(v.name.as_str()),
        _ => None,
    }
}

/// Depth-first search for a variant named `name` anywhere in `value`'s tree.
pub(crate) fn find_variant<'a, T>(value: &'a Value<T>, name: &str) -> Option<&'a Value<T>> {
    match &value.value {
        scale_value::ValueDef::Variant(v) if v.name == name => Some(value),
        scale_value::ValueDef::Variant(v) => composite_values(&v.values).into_iter().find_map(|v| find_variant(v, name)),
        scale_value::ValueDef::Composite(c) => composite_values(c).into_iter().find_map(|v| find_variant(v, name)),
        _ => None,
    }
}

/// `value` as an unsigned integer, if it decoded to one. `scale_value` keeps
/// each unsigned width (`U8`..`U128`) as a distinct `Primitive` variant
/// rather than normalizing them, so every width is widened here.
pub(crate) fn value_as_u128<T>(value: &Value<T>) -> Option<u128> {
    match &value.value {
        scale_value::ValueDef::Primitive(scale_value::Primitive::U8(n)) => Some(*n as u128),
        scale_value::ValueDef::Primitive(scale_value::Primitive::U16(n)) => Some(*n as u128),
        scale_value::ValueDef::Primitive(scale_value::Primitive::U32(n)) => Some(*n as u128),
        scale_value::ValueDef::Primitive(scale_value::Primitive::U64(n)) => Some(*n as u128),
        scale_value::ValueDef::Primitive(scale_value::Primitive::U128(n)) => Some(*n),
        _ => None,
    }
}

/// `value` as a boolean primitive, if it decoded to one.
pub(crate) fn value_as_bool<T>(value: &Value<T>) -> Option<bool> {
    match &value.value {
        scale_value::ValueDef::Primitive(scale_value::Primitive::Bool(b)) => Some(*b),
        _ => None,
    }
}

/// `value` as a byte sequence: either a single integer primitive (one byte)
/// or a composite of integer primitives (e.g. a decoded `Vec<u8>`/fixed array).
pub(crate) fn value_as_bytes<T>(value: &Value<T>) -> Vec<u8> {
    match &value.value {
        scale_value::ValueDef::Composite(c) => {
            composite_values(c).into_iter().filter_map(value_as_u128).map(|n| n as u8).collect()
        }
        _ => value_as_u128(value).map(|n| vec![n as u8]).unwrap_or_default(),
    }
}

/// `value`'s composite fields as unsigned integers, widened to `u128`,
/// skipping any field that isn't itself an unsigned integer primitive.
pub(crate) fn composite_as_u128_list<T>(value: &Value<T>) -> Vec<u128> {
    match &value.value {
        scale_value::ValueDef::Composite(c) => composite_values(c).into_iter().filter_map(value_as_u128).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_round_trip() {
        let bytes = encode_static(&42u32);
        let back: u32 = decode_static(&mut &bytes[..]).unwrap();
        assert_eq!(back, 42);
    }

    #[test]
    fn value_as_bool_and_u128_read_is_network_member_entries() {
        // Shape of a `SubtensorModule::IsNetworkMember` map entry: value is
        // the membership flag, the netuid comes from the entry's key part -
        // this is the pair `get_netuids_for_hotkey` reads per entry.
        let membership_flag = Value::bool(true);
        let netuid = Value::u128(23);
        assert_eq!(value_as_bool(&membership_flag), Some(true));
        assert_eq!(value_as_u128(&netuid), Some(23));
    }

    #[test]
    fn value_as_bytes_reads_composite_byte_sequences() {
        let bytes = Value::unnamed_composite(vec![Value::u128(0xDE), Value::u128(0xAD)]);
        assert_eq!(value_as_bytes(&bytes), vec![0xDE, 0xAD]);
    }
}
