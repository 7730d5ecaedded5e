//! Component F: block reference resolution and number/hash caching.
//!
//! Grounded on `determine_block_hash` in `examples/original_source/
//! bittensor/core/async_subtensor.py`: at most one of a block number, a
//! block hash, or "reuse the last resolved hash" may be given; block numbers
//! are resolved to hashes via `chain_getBlockHash`, and the chain head via
//! `chain_getFinalizedHead` when nothing is specified.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::config::{BlockNumber, Hash};
use crate::error::Error;
use crate::rpc::Transport;

/// LRU capacity for the block-number-to-hash cache, per §4.F.
const BLOCK_HASH_CACHE_CAPACITY: usize = 128;

/// How a caller identifies which block a query should be evaluated at.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BlockRef {
    /// The current best/finalized chain head, resolved fresh each call.
    #[default]
    Latest,
    /// A specific block number, resolved to a hash (and cached).
    Number(BlockNumber),
    /// An already-known block hash.
    Hash(Hash),
    /// Reuse whatever block hash the last [`BlockClient::resolve`] call on
    /// this client returned.
    ReuseLast,
}

/// Resolves [`BlockRef`]s to concrete block hashes, caching
/// number-to-hash lookups and remembering the last resolved hash for
/// [`BlockRef::ReuseLast`].
pub struct BlockClient {
    transport: Transport,
    cache: Mutex<LruCache<BlockNumber, Hash>>,
    last_resolved: Mutex<Option<Hash>>,
}

impl BlockClient {
    /// Construct a block client over the given transport.
    pub fn new(transport: Transport) -> Self {
        BlockClient {
            transport,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(BLOCK_HASH_CACHE_CAPACITY).expect("capacity is nonzero"),
            )),
            last_resolved: Mutex::new(None),
        }
    }

    /// The current chain head's block number.
    pub async fn current_block(&self) -> Result<BlockNumber, Error> {
        let header: BlockHeader = self.transport.call_as("chain_getHeader", serde_json::json!([])).await?;
        parse_block_number(&header.number)
    }

    /// Resolve a block number to its hash, consulting the cache first.
    pub async fn block_hash(&self, number: BlockNumber) -> Result<Hash, Error> {
        if let Some(hash) = self.cache.lock().unwrap().get(&number) {
            return Ok(*hash);
        }
        let hash: Hash = self
            .transport
            .call_as("chain_getBlockHash", serde_json::json!([number]))
            .await?;
        self.cache.lock().unwrap().put(number, hash);
        Ok(hash)
    }

    /// The current finalized chain head's hash.
    pub async fn chain_head(&self) -> Result<Hash, Error> {
        self.transport.call_as("chain_getFinalizedHead", serde_json::json!([])).await.map_err(Error::from)
    }

    /// Resolve a [`BlockRef`] to a concrete hash, recording it as the "last
    /// resolved" hash for any subsequent [`BlockRef::ReuseLast`].
    pub async fn resolve(&self, at: BlockRef) -> Result<Hash, Error> {
        let hash = match at {
            BlockRef::Latest => self.chain_head().await?,
            BlockRef::Number(n) => self.block_hash(n).await?,
            BlockRef::Hash(h) => h,
            BlockRef::ReuseLast => self
                .last_resolved
                .lock()
                .unwrap()
                .ok_or_else(|| Error::Other("no previously resolved block hash to reuse".to_owned()))?,
        };
        *self.last_resolved.lock().unwrap() = Some(hash);
        Ok(hash)
    }
}

/// Validate that at most one of `(block, block_hash, reuse_block)` was
/// supplied, and resolve them to an optional hash (`None` means "latest").
///
/// Mirrors `determine_block_hash`'s single-parameter rule exactly, without
/// the hash-vs-number resolution itself (that's [`BlockClient::resolve`]).
pub fn determine_block_ref(
    block: Option<BlockNumber>,
    block_hash: Option<Hash>,
    reuse_block: bool,
) -> Result<BlockRef, Error> {
    let specified = [block.is_some(), block_hash.is_some(), reuse_block]
        .iter()
        .filter(|x| **x)
        .count();
    if specified > 1 {
        return Err(Error::AmbiguousBlockReference);
    }
    Ok(match (block, block_hash, reuse_block) {
        (_, Some(h), _) => BlockRef::Hash(h),
        (Some(n), _, _) => BlockRef::Number(n),
        (_, _, true) => BlockRef::ReuseLast,
        _ => BlockRef::Latest,
    })
}

#[derive(serde::Deserialize)]
struct BlockHeader {
    number: String,
}

fn parse_block_number(hex: &str) -> Result<BlockNumber, Error> {
    let stripped = hex.strip_prefix("0x").unwrap_or(hex);
    BlockNumber::from_str_radix(stripped, 16)
        .map_err(|e| Error::Other(format!("invalid block number '{hex}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_block_number_hex() {
        assert_eq!(parse_block_number("0xff").unwrap(), 255);
    }

    #[test]
    fn determine_block_ref_defaults_to_latest() {
        assert_eq!(determine_block_ref(None, None, false).unwrap(), BlockRef::Latest);
    }

    #[test]
    fn determine_block_ref_rejects_multiple() {
        let hash = Hash::zero();
        assert!(matches!(
            determine_block_ref(Some(5), Some(hash), false),
            Err(Error::AmbiguousBlockReference)
        ));
    }

    #[test]
    fn determine_block_ref_picks_hash_over_number() {
        let hash = Hash::from_low_u64_be(1);
        assert_eq!(determine_block_ref(None, Some(hash), false).unwrap(), BlockRef::Hash(hash));
    }
}
