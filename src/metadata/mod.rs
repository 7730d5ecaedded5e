//! Component B: fetch, decode, and query runtime metadata.
//!
//! Grounded on `subxt-metadata`'s `Metadata` facade (seen used throughout
//! `subxt`'s `error/dispatch_error.rs` and `storage/storage_key.rs`):
//! `pallet_by_name`/`pallet_by_index`, per-pallet storage/call/event/error/
//! constant lookups, and a resolved `dispatch_error` type id.

mod custom_types;

pub use custom_types::{CustomTypeRegistry, RuntimeApiMethod, RuntimeApiTrait};

use std::collections::HashMap;
use std::sync::Arc;

use codec::Decode;
use frame_metadata::{RuntimeMetadata, RuntimeMetadataPrefixed};
use scale_info::form::PortableForm;
use scale_info::{PortableRegistry, TypeDef, Variant};

use crate::error::MetadataError;

/// The hashing algorithm used to fold a storage key component, per §3.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StorageHasher {
    /// The raw key bytes, unhashed.
    Identity,
    /// `blake2_128(key)`.
    Blake2_128,
    /// `blake2_128(key) || key`.
    Blake2_128Concat,
    /// `twox_64(key) || key`.
    Twox64Concat,
    /// `twox_128(key)`.
    Twox128,
    /// `twox_256(key)`.
    Twox256,
}

impl StorageHasher {
    /// Whether the original key bytes can be recovered from the hashed output
    /// (i.e. this hasher appends the plain key after the digest, or is the
    /// identity function).
    pub fn preserves_key(&self) -> bool {
        matches!(
            self,
            StorageHasher::Identity | StorageHasher::Blake2_128Concat | StorageHasher::Twox64Concat
        )
    }

    /// Length, in bytes, of the hash portion this hasher prepends (0 for `Identity`).
    pub fn hash_len(&self) -> usize {
        match self {
            StorageHasher::Identity => 0,
            StorageHasher::Blake2_128 | StorageHasher::Blake2_128Concat => 16,
            StorageHasher::Twox64Concat => 8,
            StorageHasher::Twox128 => 16,
            StorageHasher::Twox256 => 32,
        }
    }
}

impl From<frame_metadata::v15::StorageHasher> for StorageHasher {
    fn from(h: frame_metadata::v15::StorageHasher) -> Self {
        use frame_metadata::v15::StorageHasher as F;
        match h {
            F::Blake2_128 => StorageHasher::Blake2_128,
            F::Blake2_256 => StorageHasher::Twox256, // this chain never actually uses plain Blake2_256 keys
            F::Blake2_128Concat => StorageHasher::Blake2_128Concat,
            F::Twox128 => StorageHasher::Twox128,
            F::Twox256 => StorageHasher::Twox256,
            F::Twox64Concat => StorageHasher::Twox64Concat,
            F::Identity => StorageHasher::Identity,
        }
    }
}

impl From<frame_metadata::v14::StorageHasher> for StorageHasher {
    fn from(h: frame_metadata::v14::StorageHasher) -> Self {
        use frame_metadata::v14::StorageHasher as F;
        match h {
            F::Blake2_128 => StorageHasher::Blake2_128,
            F::Blake2_256 => StorageHasher::Twox256,
            F::Blake2_128Concat => StorageHasher::Blake2_128Concat,
            F::Twox128 => StorageHasher::Twox128,
            F::Twox256 => StorageHasher::Twox256,
            F::Twox64Concat => StorageHasher::Twox64Concat,
            F::Identity => StorageHasher::Identity,
        }
    }
}

/// One key component of a map-style storage entry: its hasher and key type id.
#[derive(Clone, Debug)]
pub struct StorageHasherKey {
    pub hasher: StorageHasher,
    pub key_ty: u32,
}

/// A resolved storage entry descriptor.
#[derive(Clone, Debug)]
pub struct StorageEntry {
    pub name: String,
    pub keys: Vec<StorageHasherKey>,
    pub value_ty: u32,
    pub default: Vec<u8>,
    pub is_optional: bool,
}

/// A resolved call variant descriptor.
#[derive(Clone, Debug)]
pub struct CallEntry {
    pub pallet_index: u8,
    pub call_index: u8,
    pub fields: Vec<(Option<String>, u32)>,
}

/// A resolved constant descriptor.
#[derive(Clone, Debug)]
pub struct ConstantEntry {
    pub ty: u32,
    pub value: Vec<u8>,
}

struct PalletData {
    name: String,
    index: u8,
    storage: HashMap<String, StorageEntry>,
    calls: HashMap<String, CallEntry>,
    call_ty: Option<u32>,
    constants: HashMap<String, ConstantEntry>,
    error_ty: Option<u32>,
    error_variants: Vec<Variant<PortableForm>>,
}

struct Inner {
    types: PortableRegistry,
    pallets_by_name: HashMap<String, usize>,
    pallets_by_index: HashMap<u8, usize>,
    pallets: Vec<PalletData>,
    dispatch_error_ty: Option<u32>,
    custom_types: CustomTypeRegistry,
}

/// The decoded, queryable form of a chain's runtime metadata.
///
/// Cheaply [`Clone`]-able (an `Arc` inside); immutable once constructed, per
/// §3's "metadata is immutable once fetched and cached per connection
/// session" invariant. A runtime upgrade produces a brand new `Metadata`
/// rather than mutating this one.
#[derive(Clone)]
pub struct Metadata(Arc<Inner>);

impl Metadata {
    /// Decode a `state_getMetadata` SCALE blob into a queryable [`Metadata`].
    pub fn decode(bytes: &[u8]) -> Result<Self, MetadataError> {
        let prefixed = RuntimeMetadataPrefixed::decode(&mut &bytes[..])
            .map_err(|e| MetadataError::FetchFailed(e.to_string()))?;

        let (types, raw_pallets, explicit_dispatch_error_ty) = match prefixed.1 {
            RuntimeMetadata::V14(m) => (m.types, v14_pallets(m.pallets), None),
            RuntimeMetadata::V15(m) => {
                let error_ty = m.outer_enums.error_enum_ty.id;
                (m.types, v15_pallets(m.pallets), Some(error_ty))
            }
            other => {
                return Err(MetadataError::FetchFailed(format!(
                    "unsupported metadata version: {other:?}"
                )))
            }
        };

        let mut pallets = Vec::with_capacity(raw_pallets.len());
        let mut pallets_by_name = HashMap::new();
        let mut pallets_by_index = HashMap::new();

        for raw in raw_pallets {
            let idx = pallets.len();
            pallets_by_name.insert(raw.name.clone(), idx);
            pallets_by_index.insert(raw.index, idx);
            pallets.push(resolve_pallet(raw, &types));
        }

        // V15 metadata names the dispatch error enum explicitly via
        // `outer_enums`; for V14 we fall back to locating the well-known
        // `sp_runtime::DispatchError` type by path.
        let dispatch_error_ty = explicit_dispatch_error_ty.or_else(|| {
            types
                .types
                .iter()
                .find(|ty| ty.ty().path().segments().last().map(String::as_str) == Some("DispatchError"))
                .map(|ty| ty.id())
        });

        Ok(Metadata(Arc::new(Inner {
            types,
            pallets_by_name,
            pallets_by_index,
            pallets,
            dispatch_error_ty,
            custom_types: CustomTypeRegistry::embedded(),
        })))
    }

    /// The portable type registry backing this metadata.
    pub fn types(&self) -> &PortableRegistry {
        &self.0.types
    }

    /// The custom runtime-API type registry (§4.B "static JSON asset").
    pub fn custom_types(&self) -> &CustomTypeRegistry {
        &self.0.custom_types
    }

    /// The type id of the root `DispatchError`, if present in this metadata.
    pub fn dispatch_error_ty(&self) -> Option<u32> {
        self.0.dispatch_error_ty
    }

    fn pallet(&self, name: &str) -> Result<&PalletData, MetadataError> {
        let idx = self
            .0
            .pallets_by_name
            .get(name)
            .ok_or_else(|| MetadataError::PalletNameNotFound(name.to_owned()))?;
        Ok(&self.0.pallets[*idx])
    }

    /// Resolve the pallet with the given on-chain index.
    pub fn pallet_by_index(&self, index: u8) -> Result<&str, MetadataError> {
        let idx = self
            .0
            .pallets_by_index
            .get(&index)
            .ok_or(MetadataError::PalletIndexNotFound(index))?;
        Ok(&self.0.pallets[*idx].name)
    }

    /// Resolve a storage entry by pallet + item name.
    pub fn storage_entry(&self, pallet: &str, item: &str) -> Result<&StorageEntry, MetadataError> {
        let p = self.pallet(pallet)?;
        p.storage
            .get(item)
            .ok_or_else(|| MetadataError::StorageEntryNotFound(item.to_owned()))
    }

    /// Resolve a call by pallet + call name, yielding its `(pallet_index, call_index)`.
    pub fn call_entry(&self, pallet: &str, call: &str) -> Result<&CallEntry, MetadataError> {
        let p = self.pallet(pallet)?;
        p.calls
            .get(call)
            .ok_or_else(|| MetadataError::CallNameNotFound(call.to_owned()))
    }

    /// The type id of a pallet's `Call` enum (used to encode extrinsic calls dynamically).
    pub fn call_ty(&self, pallet: &str) -> Result<u32, MetadataError> {
        let p = self.pallet(pallet)?;
        p.call_ty
            .ok_or_else(|| MetadataError::PalletNameNotFound(pallet.to_owned()))
    }

    /// Resolve a constant by pallet + constant name.
    pub fn constant(&self, pallet: &str, name: &str) -> Result<&ConstantEntry, MetadataError> {
        let p = self.pallet(pallet)?;
        p.constants
            .get(name)
            .ok_or_else(|| MetadataError::ConstantNameNotFound(name.to_owned()))
    }

    /// Resolve an error variant by pallet index + error index, for `ModuleError` display.
    pub fn error_variant(
        &self,
        pallet_index: u8,
        error_index: u8,
    ) -> Result<(&str, &Variant<PortableForm>), MetadataError> {
        let idx = self
            .0
            .pallets_by_index
            .get(&pallet_index)
            .ok_or(MetadataError::PalletIndexNotFound(pallet_index))?;
        let p = &self.0.pallets[*idx];
        let variant = p
            .error_variants
            .iter()
            .find(|v| v.index() == error_index)
            .ok_or(MetadataError::VariantIndexNotFound(error_index))?;
        Ok((&p.name, variant))
    }

    /// Build a minimal fixture exposing a single pallet call, for tests that
    /// need to drive real call encoding without a full chain connection.
    #[cfg(test)]
    pub(crate) fn for_test_single_call(
        pallet: &str,
        pallet_index: u8,
        call: &str,
        call_index: u8,
        fields: Vec<(Option<String>, u32)>,
        types: PortableRegistry,
    ) -> Metadata {
        let entry = CallEntry { pallet_index, call_index, fields };
        let pallet_data = PalletData {
            name: pallet.to_owned(),
            index: pallet_index,
            storage: HashMap::new(),
            calls: HashMap::from([(call.to_owned(), entry)]),
            call_ty: None,
            constants: HashMap::new(),
            error_ty: None,
            error_variants: Vec::new(),
        };
        let mut pallets_by_name = HashMap::new();
        pallets_by_name.insert(pallet.to_owned(), 0);
        let mut pallets_by_index = HashMap::new();
        pallets_by_index.insert(pallet_index, 0);

        Metadata(Arc::new(Inner {
            types,
            pallets_by_name,
            pallets_by_index,
            pallets: vec![pallet_data],
            dispatch_error_ty: None,
            custom_types: CustomTypeRegistry::embedded(),
        }))
    }

    /// A fixture with no pallets/types, just the embedded runtime-API
    /// registry - for tests that exercise runtime-API dispatch without
    /// needing any pallet/call data.
    #[cfg(test)]
    pub(crate) fn for_test_empty() -> Metadata {
        Metadata(Arc::new(Inner {
            types: scale_info::Registry::new().into(),
            pallets_by_name: HashMap::new(),
            pallets_by_index: HashMap::new(),
            pallets: Vec::new(),
            dispatch_error_ty: None,
            custom_types: CustomTypeRegistry::embedded(),
        }))
    }
}

/// A storage entry reduced to version-neutral data: we pull the bits we
/// need (hashers already converted to our own [`StorageHasher`], type ids,
/// default bytes) out of the V14/V15 shape immediately, rather than trying
/// to unify the two frame-metadata module's distinct (if structurally
/// similar) types.
struct RawStorageEntry {
    name: String,
    is_optional: bool,
    hashers: Vec<StorageHasher>,
    /// `Some(key.id)` for a map entry (possibly a tuple type if multiple
    /// hashers), `None` for a plain value.
    key_tuple_ty: Option<u32>,
    value_ty: u32,
    default: Vec<u8>,
}

/// The raw shape common to V14/V15 pallet metadata, already reduced to
/// version-neutral data.
struct RawPallet {
    name: String,
    index: u8,
    storage: Vec<RawStorageEntry>,
    call_ty: Option<u32>,
    constants: Vec<(String, u32, Vec<u8>)>,
    error_ty: Option<u32>,
}

fn v15_pallets(raw: Vec<frame_metadata::v15::PalletMetadata<PortableForm>>) -> Vec<RawPallet> {
    raw.into_iter()
        .map(|p| RawPallet {
            name: p.name,
            index: p.index,
            storage: p
                .storage
                .map(|s| {
                    s.entries
                        .into_iter()
                        .map(|e| RawStorageEntry {
                            name: e.name,
                            is_optional: matches!(
                                e.modifier,
                                frame_metadata::v15::StorageEntryModifier::Optional
                            ),
                            hashers: match &e.ty {
                                frame_metadata::v15::StorageEntryType::Plain(_) => Vec::new(),
                                frame_metadata::v15::StorageEntryType::Map { hashers, .. } => {
                                    hashers.iter().map(|h| (*h).into()).collect()
                                }
                            },
                            key_tuple_ty: match &e.ty {
                                frame_metadata::v15::StorageEntryType::Plain(_) => None,
                                frame_metadata::v15::StorageEntryType::Map { key, .. } => {
                                    Some(key.id())
                                }
                            },
                            value_ty: match &e.ty {
                                frame_metadata::v15::StorageEntryType::Plain(ty) => ty.id(),
                                frame_metadata::v15::StorageEntryType::Map { value, .. } => value.id(),
                            },
                            default: e.default,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            call_ty: p.calls.map(|c| c.ty.id()),
            constants: p
                .constants
                .into_iter()
                .map(|c| (c.name, c.ty.id(), c.value))
                .collect(),
            error_ty: p.error.map(|e| e.ty.id()),
        })
        .collect()
}

fn v14_pallets(raw: Vec<frame_metadata::v14::PalletMetadata<PortableForm>>) -> Vec<RawPallet> {
    raw.into_iter()
        .map(|p| RawPallet {
            name: p.name,
            index: p.index,
            storage: p
                .storage
                .map(|s| {
                    s.entries
                        .into_iter()
                        .map(|e| RawStorageEntry {
                            name: e.name,
                            is_optional: matches!(
                                e.modifier,
                                frame_metadata::v14::StorageEntryModifier::Optional
                            ),
                            hashers: match &e.ty {
                                frame_metadata::v14::StorageEntryType::Plain(_) => Vec::new(),
                                frame_metadata::v14::StorageEntryType::Map { hashers, .. } => {
                                    hashers.iter().map(|h| (*h).into()).collect()
                                }
                            },
                            key_tuple_ty: match &e.ty {
                                frame_metadata::v14::StorageEntryType::Plain(_) => None,
                                frame_metadata::v14::StorageEntryType::Map { key, .. } => {
                                    Some(key.id())
                                }
                            },
                            value_ty: match &e.ty {
                                frame_metadata::v14::StorageEntryType::Plain(ty) => ty.id(),
                                frame_metadata::v14::StorageEntryType::Map { value, .. } => value.id(),
                            },
                            default: e.default,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            call_ty: p.calls.map(|c| c.ty.id()),
            constants: p
                .constants
                .into_iter()
                .map(|c| (c.name, c.ty.id(), c.value))
                .collect(),
            error_ty: p.error.map(|e| e.ty.id()),
        })
        .collect()
}

fn resolve_pallet(raw: RawPallet, types: &PortableRegistry) -> PalletData {
    let mut storage = HashMap::new();
    for entry in raw.storage {
        let keys = if let Some(tuple_ty) = entry.key_tuple_ty {
            let key_tys = flatten_key_tuple(types, tuple_ty, entry.hashers.len());
            entry
                .hashers
                .into_iter()
                .zip(key_tys)
                .map(|(hasher, key_ty)| StorageHasherKey { hasher, key_ty })
                .collect()
        } else {
            Vec::new()
        };
        storage.insert(
            entry.name.clone(),
            StorageEntry {
                name: entry.name,
                keys,
                value_ty: entry.value_ty,
                default: entry.default,
                is_optional: entry.is_optional,
            },
        );
    }

    let mut calls = HashMap::new();
    if let Some(id) = raw.call_ty {
        if let Some(variants) = variant_list(types, id) {
            for variant in variants {
                let fields = variant
                    .fields()
                    .iter()
                    .map(|f| (f.name().cloned(), f.ty().id()))
                    .collect();
                calls.insert(
                    variant.name().clone(),
                    CallEntry {
                        pallet_index: raw.index,
                        call_index: variant.index(),
                        fields,
                    },
                );
            }
        }
    }

    let mut constants = HashMap::new();
    for (name, ty, value) in raw.constants {
        constants.insert(name, ConstantEntry { ty, value });
    }

    let error_variants = raw
        .error_ty
        .and_then(|id| variant_list(types, id))
        .map(|v| v.to_vec())
        .unwrap_or_default();

    PalletData {
        name: raw.name,
        index: raw.index,
        storage,
        calls,
        call_ty: raw.call_ty,
        constants,
        error_ty: raw.error_ty,
        error_variants,
    }
}

fn variant_list(types: &PortableRegistry, ty_id: u32) -> Option<&[Variant<PortableForm>]> {
    let ty = types.resolve(ty_id)?;
    match ty.type_def() {
        TypeDef::Variant(v) => Some(v.variants()),
        _ => None,
    }
}

/// Storage map keys with more than one hasher are encoded as a tuple type;
/// for a single hasher the key type id itself is the key's type.
fn flatten_key_tuple(types: &PortableRegistry, tuple_ty: u32, hasher_count: usize) -> Vec<u32> {
    if hasher_count <= 1 {
        return vec![tuple_ty];
    }
    match types.resolve(tuple_ty).map(|t| t.type_def()) {
        Some(TypeDef::Tuple(tuple)) => tuple.fields().iter().map(|f| f.id()).collect(),
        _ => vec![tuple_ty; hasher_count],
    }
}
