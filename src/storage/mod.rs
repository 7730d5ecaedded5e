//! Component D: runtime storage key composition and lookup.
//!
//! Grounded on `subxt`'s `storage/storage_client.rs` (`StorageMapKey::new`'s
//! encode-then-hash pattern, `KeyIter`'s buffered-paging shape) and
//! `utils/hasher.rs`-equivalent hashing, but using `sp-crypto-hashing`
//! directly rather than `sp-core`'s re-exports, and decoding values
//! dynamically against the metadata's `PortableRegistry` (component C)
//! rather than a statically generated `Decode` type.

use crate::codec::DecodedValue;
use crate::config::Hash;
use crate::error::{Error, StorageAddressError};
use crate::metadata::{Metadata, StorageHasher};
use crate::rpc::Transport;

/// Page size used by [`StorageClient::query_map`], per §4.D.
pub const QUERY_MAP_PAGE_SIZE: u32 = 1000;

fn hash_key_part(hasher: StorageHasher, encoded: &[u8]) -> Vec<u8> {
    match hasher {
        StorageHasher::Identity => encoded.to_vec(),
        StorageHasher::Blake2_128 => sp_crypto_hashing::blake2_128(encoded).to_vec(),
        StorageHasher::Blake2_128Concat => {
            let mut out = sp_crypto_hashing::blake2_128(encoded).to_vec();
            out.extend_from_slice(encoded);
            out
        }
        StorageHasher::Twox64Concat => {
            let mut out = sp_crypto_hashing::twox_64(encoded).to_vec();
            out.extend_from_slice(encoded);
            out
        }
        StorageHasher::Twox128 => sp_crypto_hashing::twox_128(encoded).to_vec(),
        StorageHasher::Twox256 => sp_crypto_hashing::twox_256(encoded).to_vec(),
    }
}

/// Compose the full storage key for `pallet::item`, given each key
/// component's already-SCALE-encoded bytes (in declaration order).
///
/// `twox_128(pallet) ++ twox_128(item)`, followed by `hash(key)` for each
/// declared key part, per §3/§4.D.
pub fn storage_key(
    metadata: &Metadata,
    pallet: &str,
    item: &str,
    key_parts: &[Vec<u8>],
) -> Result<Vec<u8>, Error> {
    let entry = metadata.storage_entry(pallet, item)?;
    if key_parts.len() > entry.keys.len() {
        return Err(StorageAddressError::TooManyKeys {
            expected: entry.keys.len(),
        }
        .into());
    }

    let mut bytes = sp_crypto_hashing::twox_128(pallet.as_bytes()).to_vec();
    bytes.extend_from_slice(&sp_crypto_hashing::twox_128(item.as_bytes()));

    for (part, key) in entry.keys.iter().zip(key_parts) {
        bytes.extend(hash_key_part(part.hasher, key));
    }

    Ok(bytes)
}

/// A storage client bound to a single transport + metadata snapshot.
#[derive(Clone)]
pub struct StorageClient {
    transport: Transport,
    metadata: Metadata,
}

impl StorageClient {
    /// Construct a storage client for the given transport and cached metadata.
    pub fn new(transport: Transport, metadata: Metadata) -> Self {
        StorageClient { transport, metadata }
    }

    /// Fetch and decode a single storage value, or `None` if absent.
    pub async fn get(
        &self,
        pallet: &str,
        item: &str,
        key_parts: &[Vec<u8>],
        at: Option<Hash>,
    ) -> Result<Option<DecodedValue>, Error> {
        let entry = self.metadata.storage_entry(pallet, item)?;
        let key = storage_key(&self.metadata, pallet, item, key_parts)?;
        let params = state_storage_params(&key, at);
        let result: Option<String> = self.transport.call_as("state_getStorage", params).await?;
        let Some(hex_value) = result else {
            return Ok(None);
        };
        let bytes = hex_decode(&hex_value)?;
        let value = crate::codec::decode_value(&mut &bytes[..], entry.value_ty, &self.metadata)?;
        Ok(Some(value))
    }

    /// Fetch a storage value, falling back to its declared on-chain default if absent.
    pub async fn get_or_default(
        &self,
        pallet: &str,
        item: &str,
        key_parts: &[Vec<u8>],
        at: Option<Hash>,
    ) -> Result<DecodedValue, Error> {
        if let Some(v) = self.get(pallet, item, key_parts, at).await? {
            return Ok(v);
        }
        let entry = self.metadata.storage_entry(pallet, item)?;
        let value = crate::codec::decode_value(&mut &entry.default[..], entry.value_ty, &self.metadata)?;
        Ok(value)
    }

    /// Fetch several storage values at once via `state_queryStorageAt`.
    pub async fn query_multi(
        &self,
        pallet: &str,
        item: &str,
        keys: &[Vec<Vec<u8>>],
        at: Option<Hash>,
    ) -> Result<Vec<Option<DecodedValue>>, Error> {
        let entry = self.metadata.storage_entry(pallet, item)?;
        let composed: Vec<String> = keys
            .iter()
            .map(|k| hex_encode(&storage_key(&self.metadata, pallet, item, k)?))
            .collect::<Result<_, Error>>()?;

        let params = serde_json::json!([composed, at.map(|h| hex_encode_hash(h))]);
        let change_sets: Vec<StorageChangeSet> = self.transport.call_as("state_queryStorageAt", params).await?;

        let mut values_by_key = std::collections::HashMap::new();
        for set in change_sets {
            for (k, v) in set.changes {
                values_by_key.insert(k, v);
            }
        }

        composed
            .into_iter()
            .map(|k| match values_by_key.get(&k).and_then(|v| v.clone()) {
                Some(hex_value) => {
                    let bytes = hex_decode(&hex_value)?;
                    let value = crate::codec::decode_value(&mut &bytes[..], entry.value_ty, &self.metadata)?;
                    Ok(Some(value))
                }
                None => Ok(None),
            })
            .collect()
    }

    /// Begin a paged iteration of a storage map, fixing the iterated-over
    /// partial key prefix (leading hashed key components that are already
    /// known, e.g. a subnet's `netuid` in a doubly-mapped entry).
    pub fn query_map<'a>(
        &'a self,
        pallet: &'a str,
        item: &'a str,
        fixed_key_parts: &[Vec<u8>],
        at: Option<Hash>,
    ) -> Result<StorageMapIter<'a>, Error> {
        let entry = self.metadata.storage_entry(pallet, item)?;
        let prefix = storage_key(&self.metadata, pallet, item, fixed_key_parts)?;
        let remaining_hashers = entry.keys[fixed_key_parts.len()..].to_vec();
        Ok(StorageMapIter {
            client: self,
            prefix,
            remaining_hashers,
            value_ty: entry.value_ty,
            at,
            start_key: None,
            buffer: Vec::new(),
            exhausted: false,
        })
    }

    /// Resolve a pallet constant to its decoded value.
    pub fn get_constant(&self, pallet: &str, name: &str) -> Result<DecodedValue, Error> {
        let entry = self.metadata.constant(pallet, name)?;
        let value = crate::codec::decode_value(&mut &entry.value[..], entry.ty, &self.metadata)?;
        Ok(value)
    }
}

/// A decoded `(key parts, value)` pair yielded by [`StorageMapIter`].
pub struct StorageMapEntry {
    /// The part of the storage key for each map key component that could be
    /// reconstructed (`None` for hashers that don't preserve the original bytes).
    pub key_parts: Vec<Option<DecodedValue>>,
    /// The decoded storage value.
    pub value: DecodedValue,
}

/// An async, page-buffered iterator over a storage map's entries.
pub struct StorageMapIter<'a> {
    client: &'a StorageClient,
    prefix: Vec<u8>,
    remaining_hashers: Vec<crate::metadata::StorageHasherKey>,
    value_ty: u32,
    at: Option<Hash>,
    start_key: Option<String>,
    buffer: Vec<(String, String)>,
    exhausted: bool,
}

impl<'a> StorageMapIter<'a> {
    /// Yield the next decoded `(key, value)` pair, fetching another page once the buffer drains.
    pub async fn next(&mut self) -> Result<Option<StorageMapEntry>, Error> {
        loop {
            if let Some((key_hex, value_hex)) = self.buffer.pop() {
                let key_bytes = hex_decode(&key_hex)?;
                let value_bytes = hex_decode(&value_hex)?;
                let value =
                    crate::codec::decode_value(&mut &value_bytes[..], self.value_ty, &self.client.metadata)?;
                let key_parts = self.decode_key_parts(&key_bytes)?;
                return Ok(Some(StorageMapEntry { key_parts, value }));
            }

            if self.exhausted {
                return Ok(None);
            }

            let prefix_hex = hex_encode(&self.prefix);
            let params = serde_json::json!([
                prefix_hex,
                QUERY_MAP_PAGE_SIZE,
                self.start_key,
                self.at.map(hex_encode_hash),
            ]);
            let keys: Vec<String> = self.client.transport.call_as("state_getKeysPaged", params).await?;
            if keys.is_empty() {
                self.exhausted = true;
                continue;
            }
            self.start_key = keys.last().cloned();
            if (keys.len() as u32) < QUERY_MAP_PAGE_SIZE {
                self.exhausted = true;
            }

            let at_param = serde_json::json!([keys, self.at.map(hex_encode_hash)]);
            let change_sets: Vec<StorageChangeSet> =
                self.client.transport.call_as("state_queryStorageAt", at_param).await?;
            for set in change_sets {
                for (k, v) in set.changes {
                    if let Some(v) = v {
                        self.buffer.push((k, v));
                    }
                }
            }
        }
    }

    /// Reconstruct the trailing (not-yet-fixed) key components of a full
    /// storage key, decoding whichever parts used a hasher that preserves
    /// the original bytes (`Identity`, `*Concat`). Per §4.D only the last
    /// remaining component's bytes are unambiguous without re-encoding
    /// candidate keys, so this only supports iterating one map level at a
    /// time (the common case: a single trailing key, or none).
    fn decode_key_parts(&self, full_key: &[u8]) -> Result<Vec<Option<DecodedValue>>, Error> {
        // The pallet::item prefix is always 32 bytes (two twox_128 hashes);
        // fixed key parts were already folded into `self.prefix`, so whatever
        // follows belongs to `remaining_hashers`.
        let mut offset = self.prefix.len();
        let mut out = Vec::with_capacity(self.remaining_hashers.len());
        for part in &self.remaining_hashers {
            let hash_len = part.hasher.hash_len();
            if !part.hasher.preserves_key() {
                out.push(None);
                offset += hash_len;
                continue;
            }
            let value_start = offset + hash_len;
            let bytes = &full_key[value_start..];
            let decoded =
                scale_value::scale::decode_as_type(&mut &*bytes, part.key_ty, self.client.metadata.types()).ok();
            out.push(decoded);
            offset = full_key.len();
        }
        Ok(out)
    }
}

#[derive(serde::Deserialize)]
struct StorageChangeSet {
    #[allow(dead_code)]
    block: String,
    changes: Vec<(String, Option<String>)>,
}

fn state_storage_params(key: &[u8], at: Option<Hash>) -> serde_json::Value {
    match at {
        Some(h) => serde_json::json!([hex_encode(key), hex_encode_hash(h)]),
        None => serde_json::json!([hex_encode(key)]),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn hex_encode_hash(hash: Hash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

fn hex_decode(s: &str) -> Result<Vec<u8>, Error> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| Error::Other(format!("invalid hex in RPC response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_key_part_identity_is_passthrough() {
        let out = hash_key_part(StorageHasher::Identity, &[1, 2, 3]);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn hash_key_part_concat_appends_original_bytes() {
        let out = hash_key_part(StorageHasher::Twox64Concat, &[9, 9]);
        assert_eq!(&out[8..], &[9, 9]);
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn hash_key_part_blake2_128_concat_appends_original_bytes() {
        let out = hash_key_part(StorageHasher::Blake2_128Concat, &[1, 2, 3, 4]);
        assert_eq!(&out[16..], &[1, 2, 3, 4]);
        assert_eq!(out.len(), 20);
    }
}
