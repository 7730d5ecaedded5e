//! Component H: the weight commit/reveal state machine.
//!
//! Grounded on §3's `WeightCommitment` hash definition and §4.H's state
//! machine (`Idle -> CommitPending -> Committed -> Idle`), with the
//! hyperparameter reads (`CommitRevealWeightsEnabled`, `Tempo`,
//! `WeightsSetRateLimit`, `RevealPeriodEpochs`, `LastUpdate`) grounded on
//! `get_hyperparameter`/`blocks_since_last_update`/`tempo`/
//! `weights_rate_limit`/`commit_reveal_enabled` in `examples/original_source/
//! bittensor/core/async_subtensor.py`. Unlike that source's single blocking
//! `set_weights` call, the commit-reveal path here runs as a persistent
//! `tokio::spawn`-ed task that yields across block observations (via
//! `chain_subscribeNewHeads`) and reports progress through a
//! `tokio::sync::watch` channel, per §9's redesign note that long commit-to-
//! reveal waits must not be modeled as a single blocking request.

use codec::Encode;
use rand::RngCore;
use scale_value::Value;
use tokio::sync::watch;

use crate::block::BlockClient;
use crate::codec::{composite_as_u128_list, value_as_bool, value_as_u128};
use crate::config::{AccountId32, Hash};
use crate::error::Error;
use crate::storage::StorageClient;
use crate::tx::signer::Signer;
use crate::tx::{Call, TxClient, TxParams};

/// Progress of a single commit-reveal cycle for one `(netuid, hotkey)` pair,
/// broadcast over a [`watch`] channel so callers can observe it without
/// blocking on the whole cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum WeightCommitState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Waiting for the rate limit to clear before submitting the commit.
    AwaitingRateLimit,
    /// The commit hash has been submitted and is awaiting inclusion.
    CommitPending,
    /// The commit landed; waiting for the reveal window to open.
    Committed {
        /// Block the commit was included in.
        commit_block: u64,
        /// Block at or after which the reveal becomes valid.
        reveal_at_block: u64,
    },
    /// The reveal has been submitted and is awaiting inclusion.
    RevealPending,
    /// The cycle completed: the reveal was included successfully.
    Done,
    /// The cycle gave up after exhausting its retries.
    Failed(String),
}

/// Compute the commitment hash per §3:
/// `blake2_256(hotkey ++ netuid ++ uids ++ weights ++ salt ++ version_key)`.
///
/// `(uids, weights)` are sorted by uid first, so permuting the input arrays
/// by a common permutation yields the same hash (§7 determinism property).
pub fn generate_weight_hash(
    hotkey: &AccountId32,
    netuid: u16,
    uids: &[u16],
    weights: &[u16],
    salt: &[u8; 32],
    version_key: u64,
) -> [u8; 32] {
    let mut pairs: Vec<(u16, u16)> = uids.iter().copied().zip(weights.iter().copied()).collect();
    pairs.sort_by_key(|(uid, _)| *uid);
    let (sorted_uids, sorted_weights): (Vec<u16>, Vec<u16>) = pairs.into_iter().unzip();

    let mut bytes = Vec::new();
    hotkey.encode_to(&mut bytes);
    netuid.encode_to(&mut bytes);
    sorted_uids.encode_to(&mut bytes);
    sorted_weights.encode_to(&mut bytes);
    salt.encode_to(&mut bytes);
    version_key.encode_to(&mut bytes);
    sp_crypto_hashing::blake2_256(&bytes)
}

/// 32 random bytes suitable for use as a commit salt.
fn random_salt() -> [u8; 32] {
    let mut salt = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// A single weight-commit entry recorded in `SubtensorModule::CRV3WeightCommits`.
#[derive(Clone, Debug)]
pub struct WeightCommitInfo {
    /// The account that submitted the commit.
    pub who: AccountId32,
    /// The opaque, still-encrypted commit payload.
    pub serialized_commit: Vec<u8>,
    /// The Drand round this commit is tied to for round-based reveal.
    pub reveal_round: u64,
}

fn decode_weight_commit_entry<T>(value: &scale_value::Value<T>) -> Option<WeightCommitInfo> {
    let fields = crate::codec::composite_values(match &value.value {
        scale_value::ValueDef::Composite(c) => c,
        _ => return None,
    });
    let who = AccountId32(crate::codec::value_as_bytes(*fields.first()?).try_into().ok()?);
    let serialized_commit = fields.get(1).map(|v| crate::codec::value_as_bytes(*v)).unwrap_or_default();
    let reveal_round = fields.get(2).and_then(|v| value_as_u128(*v)).unwrap_or(0) as u64;
    Some(WeightCommitInfo { who, serialized_commit, reveal_round })
}

/// Reads the commit-reveal hyperparameters and drives the commit/reveal
/// extrinsics for one chain connection.
#[derive(Clone)]
pub struct WeightsClient {
    storage: StorageClient,
    tx: TxClient,
    blocks: std::sync::Arc<BlockClient>,
    transport: crate::rpc::Transport,
}

impl WeightsClient {
    /// Construct a weights client sharing the given components.
    pub fn new(
        transport: crate::rpc::Transport,
        storage: StorageClient,
        tx: TxClient,
        blocks: std::sync::Arc<BlockClient>,
    ) -> Self {
        WeightsClient { storage, tx, blocks, transport }
    }

    /// Whether commit-reveal is enabled for `netuid`.
    pub async fn commit_reveal_enabled(&self, netuid: u16, at: Option<Hash>) -> Result<bool, Error> {
        let key = netuid.encode();
        let value = self.storage.get_or_default("SubtensorModule", "CommitRevealWeightsEnabled", &[key], at).await?;
        Ok(value_as_bool(&value).unwrap_or(false))
    }

    /// The subnet's `Tempo` hyperparameter (blocks per epoch).
    pub async fn tempo(&self, netuid: u16, at: Option<Hash>) -> Result<u64, Error> {
        let key = netuid.encode();
        let value = self.storage.get_or_default("SubtensorModule", "Tempo", &[key], at).await?;
        Ok(value_as_u128(&value).unwrap_or(0) as u64)
    }

    /// The subnet's `WeightsSetRateLimit` hyperparameter, in blocks.
    pub async fn weights_rate_limit(&self, netuid: u16, at: Option<Hash>) -> Result<u64, Error> {
        let key = netuid.encode();
        let value = self.storage.get_or_default("SubtensorModule", "WeightsSetRateLimit", &[key], at).await?;
        Ok(value_as_u128(&value).unwrap_or(0) as u64)
    }

    /// The subnet's `RevealPeriodEpochs` hyperparameter.
    pub async fn reveal_period_epochs(&self, netuid: u16, at: Option<Hash>) -> Result<u64, Error> {
        let key = netuid.encode();
        let value = self.storage.get_or_default("SubtensorModule", "RevealPeriodEpochs", &[key], at).await?;
        Ok(value_as_u128(&value).unwrap_or(0) as u64)
    }

    /// Blocks elapsed since `uid` last had its weights updated on `netuid`,
    /// from the subnet's `LastUpdate` vector.
    pub async fn blocks_since_last_update(&self, netuid: u16, uid: u16, at: Option<Hash>) -> Result<u64, Error> {
        let key = netuid.encode();
        let value = self.storage.get_or_default("SubtensorModule", "LastUpdate", &[key], at).await?;
        let last_updates = composite_as_u128_list(&value);
        let last_update = *last_updates.get(uid as usize).unwrap_or(&0) as u64;
        let current = self.blocks.current_block().await?;
        Ok(current.saturating_sub(last_update))
    }

    /// The first map entry's pending CRV3 weight commits for `netuid`,
    /// exactly reproducing the source's `result.records[0][1]` slice (§9 Open
    /// Question: it is unclear whether the source intends only the first map
    /// entry or this is an oversight; the literal behavior is preserved
    /// here, and [`Self::all_weight_commit_info`] exposes the full map).
    pub async fn current_weight_commit_info(&self, netuid: u16, at: Option<Hash>) -> Result<Vec<WeightCommitInfo>, Error> {
        Ok(self.all_weight_commit_info(netuid, at).await?.into_iter().next().map(|(_, v)| v).unwrap_or_default())
    }

    /// Every `CRV3WeightCommits` map entry for `netuid`, keyed by whatever
    /// the entry's remaining (non-`netuid`) key component is.
    pub async fn all_weight_commit_info(
        &self,
        netuid: u16,
        at: Option<Hash>,
    ) -> Result<Vec<(Vec<u8>, Vec<WeightCommitInfo>)>, Error> {
        let mut iter = self.storage.query_map("SubtensorModule", "CRV3WeightCommits", &[netuid.encode()], at)?;
        let mut out = Vec::new();
        while let Some(entry) = iter.next().await? {
            let key_bytes = entry.key_parts.into_iter().flatten().fold(Vec::new(), |mut acc, v| {
                acc.extend(crate::codec::value_as_bytes(&v));
                acc
            });
            let commits = match &entry.value.value {
                scale_value::ValueDef::Composite(c) => {
                    crate::codec::composite_values(c).into_iter().filter_map(decode_weight_commit_entry).collect()
                }
                _ => Vec::new(),
            };
            out.push((key_bytes, commits));
        }
        Ok(out)
    }

    /// Submit the legacy (non-commit-reveal) `set_weights` extrinsic.
    pub async fn set_weights(
        &self,
        signer: &dyn Signer,
        netuid: u16,
        uids: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        params: &TxParams,
    ) -> Result<Hash, Error> {
        let call = Call::new(
            "SubtensorModule",
            "set_weights",
            vec![Value::u128(netuid as u128), uids_value(&uids), weights_value(&weights), Value::u128(version_key as u128)],
        );
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    async fn commit_weights(&self, signer: &dyn Signer, netuid: u16, commit_hash: [u8; 32], params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new(
            "SubtensorModule",
            "commit_weights",
            vec![Value::u128(netuid as u128), Value::unnamed_composite(commit_hash.iter().map(|b| Value::u128(*b as u128)).collect())],
        );
        let in_block = self.tx.sign_and_send(&call, signer, params).await?.wait_for_in_block().await?;
        Ok(in_block.block_hash())
    }

    async fn reveal_weights(
        &self,
        signer: &dyn Signer,
        netuid: u16,
        uids: &[u16],
        weights: &[u16],
        salt: &[u8; 32],
        version_key: u64,
        params: &TxParams,
    ) -> Result<Hash, Error> {
        let call = Call::new(
            "SubtensorModule",
            "reveal_weights",
            vec![
                Value::u128(netuid as u128),
                uids_value(uids),
                weights_value(weights),
                Value::unnamed_composite(salt.iter().map(|b| Value::u128(*b as u128)).collect()),
                Value::u128(version_key as u128),
            ],
        );
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// Drive the full commit-reveal cycle for `(netuid, signer's hotkey)` as
    /// a persistent background task, reporting progress on the returned
    /// [`watch::Receiver`]. Falls back to the legacy `set_weights` extrinsic
    /// if commit-reveal isn't enabled for `netuid`.
    ///
    /// Retry policy: up to `max_retries` attempts at acquiring the rate-limit
    /// window before giving up with [`Error::TooSoonToSetWeights`].
    pub fn spawn_set_weights<S: Signer + Send + Sync + 'static>(
        self,
        signer: std::sync::Arc<S>,
        netuid: u16,
        uid: u16,
        uids: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        params: TxParams,
        max_retries: u32,
    ) -> watch::Receiver<WeightCommitState> {
        let (tx_status, rx_status) = watch::channel(WeightCommitState::Idle);
        tokio::spawn(async move {
            let result = self
                .run_set_weights_cycle(&*signer, netuid, uid, uids, weights, version_key, &params, max_retries, &tx_status)
                .await;
            if let Err(e) = result {
                let _ = tx_status.send(WeightCommitState::Failed(e.to_string()));
            }
        });
        rx_status
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_set_weights_cycle(
        &self,
        signer: &dyn Signer,
        netuid: u16,
        uid: u16,
        uids: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        params: &TxParams,
        max_retries: u32,
        status: &watch::Sender<WeightCommitState>,
    ) -> Result<(), Error> {
        if !self.commit_reveal_enabled(netuid, None).await? {
            status.send_replace(WeightCommitState::CommitPending);
            self.set_weights(signer, netuid, uids, weights, version_key, params).await?;
            status.send_replace(WeightCommitState::Done);
            return Ok(());
        }

        let mut attempt = 0;
        loop {
            status.send_replace(WeightCommitState::AwaitingRateLimit);
            self.await_rate_limit_clear(netuid, uid, attempt, max_retries).await?;

            status.send_replace(WeightCommitState::CommitPending);
            let salt = random_salt();
            let commit_hash = generate_weight_hash(signer.account_id(), netuid, &uids, &weights, &salt, version_key);
            let commit_block_hash = self.commit_weights(signer, netuid, commit_hash, params).await;
            attempt += 1;
            let commit_block_hash = match commit_block_hash {
                Ok(h) => h,
                Err(e) if attempt >= max_retries => return Err(e),
                Err(_) => continue,
            };

            let commit_block = self.blocks.current_block().await?;
            let _ = commit_block_hash;
            let reveal_period = self.reveal_period_epochs(netuid, None).await?;
            let tempo = self.tempo(netuid, None).await?;
            let reveal_at_block = commit_block + reveal_period * tempo;
            status.send_replace(WeightCommitState::Committed { commit_block, reveal_at_block });

            self.wait_for_block(reveal_at_block).await?;

            status.send_replace(WeightCommitState::RevealPending);
            match self.reveal_weights(signer, netuid, &uids, &weights, &salt, version_key, params).await {
                Ok(_) => {
                    status.send_replace(WeightCommitState::Done);
                    return Ok(());
                }
                Err(e) if attempt >= max_retries => return Err(e),
                Err(_) => continue,
            }
        }
    }

    /// Abort with [`Error::TooSoonToSetWeights`] once retries are exhausted
    /// and the rate limit still hasn't cleared; otherwise block until it has.
    async fn await_rate_limit_clear(&self, netuid: u16, uid: u16, attempt: u32, max_retries: u32) -> Result<(), Error> {
        loop {
            let elapsed = self.blocks_since_last_update(netuid, uid, None).await?;
            let limit = self.weights_rate_limit(netuid, None).await?;
            if elapsed > limit {
                return Ok(());
            }
            if attempt >= max_retries {
                return Err(Error::TooSoonToSetWeights { netuid, blocks_remaining: limit.saturating_sub(elapsed) });
            }
            self.wait_for_block(self.blocks.current_block().await? + 1).await?;
        }
    }

    /// Block (by suspending on `chain_subscribeNewHeads`, never busy-polling)
    /// until the chain head reaches `target_block`.
    async fn wait_for_block(&self, target_block: u64) -> Result<(), Error> {
        if self.blocks.current_block().await? >= target_block {
            return Ok(());
        }
        let mut sub = self
            .transport
            .subscribe("chain_subscribeNewHeads", serde_json::json!([]), "chain_unsubscribeNewHeads")
            .await?;
        while let Some(head) = sub.next().await {
            let header = head?;
            if parse_head_number(&header)? >= target_block {
                return Ok(());
            }
        }
        Err(crate::error::RpcError::SubscriptionDropped.into())
    }
}

fn uids_value(uids: &[u16]) -> Value<()> {
    Value::unnamed_composite(uids.iter().map(|u| Value::u128(*u as u128)).collect())
}

fn weights_value(weights: &[u16]) -> Value<()> {
    Value::unnamed_composite(weights.iter().map(|w| Value::u128(*w as u128)).collect())
}

fn parse_head_number(header: &serde_json::Value) -> Result<u64, Error> {
    let hex = header
        .get("number")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Other("new-head notification missing 'number'".to_owned()))?;
    let stripped = hex.strip_prefix("0x").unwrap_or(hex);
    u64::from_str_radix(stripped, 16).map_err(|e| Error::Other(format!("invalid block number '{hex}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_hash_is_permutation_invariant() {
        let hotkey = AccountId32([7u8; 32]);
        let salt = [1u8; 32];
        let a = generate_weight_hash(&hotkey, 1, &[1, 2, 3], &[10, 20, 30], &salt, 0);
        let b = generate_weight_hash(&hotkey, 1, &[3, 1, 2], &[30, 10, 20], &salt, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn weight_hash_changes_with_salt() {
        let hotkey = AccountId32([7u8; 32]);
        let a = generate_weight_hash(&hotkey, 1, &[1], &[10], &[1u8; 32], 0);
        let b = generate_weight_hash(&hotkey, 1, &[1], &[10], &[2u8; 32], 0);
        assert_ne!(a, b);
    }

    #[test]
    fn parse_head_number_hex() {
        assert_eq!(parse_head_number(&serde_json::json!({"number": "0x2710"})).unwrap(), 10_000);
    }

    #[test]
    fn reveal_boundary_matches_example() {
        let commit_block = 1000u64;
        let tempo = 360u64;
        let reveal_period = 1u64;
        let reveal_at = commit_block + reveal_period * tempo;
        assert_eq!(reveal_at, 1360);
        assert!(1000 + 359 < reveal_at);
        assert!(1000 + 360 >= reveal_at);
    }

    #[test]
    fn blocks_since_last_update_matches_example() {
        let last_updates = Value::unnamed_composite(
            (0..6).map(|uid| Value::u128(if uid == 5 { 1_970_456 } else { 0 })).collect(),
        );
        let decoded = composite_as_u128_list(&last_updates);
        let last_update = *decoded.get(5).unwrap_or(&0) as u64;
        let current_block = 3_264_143u64;
        assert_eq!(current_block.saturating_sub(last_update), 1_293_687);
    }
}
