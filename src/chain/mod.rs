//! The public facade: a single async client combining the transport,
//! metadata, storage, runtime API, block, extrinsic, and weight-commit
//! components into the named operations `examples/original_source/bittensor/
//! core/async_subtensor.py`'s `AsyncSubtensor` exposes.
//!
//! Storage/runtime-API item names throughout this module (`System::Account`,
//! `SubtensorModule::{Owner,Uids,IsNetworkMember,ChildKeys,TotalNetworks}`,
//! `Balances::ExistentialDeposit`, `Drand::LastStoredRound`,
//! `Triumvirate::Voting`) are grounded directly on the storage-function names
//! passed to `self.substrate.query(...)`/`query_map(...)` at the
//! corresponding call sites in that file. Where a call site composes an
//! extrinsic (`transfer_allow_death`, `add_stake`, `serve_axon`, ...), the
//! pallet/call name is grounded the same way, but the dynamic `Value` field
//! shapes (particularly the `MultiAddress::Id(..)` wrapper `Balances` calls
//! expect for their `dest` parameter) follow standard Substrate pallet
//! conventions rather than a retrievable source line, since `compose_call`'s
//! argument encoding happens inside `py-substrate-interface`, which isn't
//! part of the retrieved corpus; recorded as a self-designed decision in
//! DESIGN.md.

pub mod sync;

use std::sync::Arc;

use codec::Encode;
use scale_value::Value;

use crate::block::{determine_block_ref, BlockClient};
use crate::codec::{composite_values, value_as_bool, value_as_bytes, value_as_u128};
use crate::config::{AccountId32, Endpoint, Hash};
use crate::error::Error;
use crate::metadata::Metadata;
use crate::records::{AxonInfo, DelegateInfo, IdentityInfo, NeuronInfo, NeuronInfoLite, StakeInfo, SubnetHyperparams, SubnetInfo};
use crate::rpc::Transport;
use crate::runtime_api::RuntimeApiClient;
use crate::storage::StorageClient;
use crate::tx::signer::{Signer, SigningAccount};
use crate::tx::{Call, TxClient, TxParams};
use crate::units::Balance;
use crate::weights::{WeightCommitState, WeightCommitInfo, WeightsClient};

/// Literal fallback fee estimate (0.02 tao) used when `payment_queryInfo`
/// itself fails, matching the original's `{"partialFee": int(2e7)}` escape hatch.
const FALLBACK_TRANSFER_FEE_RAO: u64 = 20_000_000;

/// The top-level async client: one connection, every component wired together.
#[derive(Clone)]
pub struct Chain {
    transport: Transport,
    metadata: Metadata,
    storage: StorageClient,
    tx: TxClient,
    runtime_api: RuntimeApiClient,
    blocks: Arc<BlockClient>,
    weights: WeightsClient,
}

impl Chain {
    /// Connect to `endpoint`, fetching and decoding metadata once up front
    /// (§4.B: "immutable once fetched and cached per connection session").
    pub async fn connect(endpoint: Endpoint) -> Result<Self, Error> {
        let transport = Transport::connect(endpoint.url()).await?;
        let metadata_hex: String = transport.call_as("state_getMetadata", serde_json::json!([])).await?;
        let bytes = hex_decode(&metadata_hex)?;
        let metadata = Metadata::decode(&bytes)?;

        Ok(Self::from_parts(transport, metadata))
    }

    /// Wire up every component client over an already-connected transport and
    /// already-decoded metadata. Split out of [`Chain::connect`] so tests can
    /// build a `Chain` against a mock transport without a real node.
    fn from_parts(transport: Transport, metadata: Metadata) -> Self {
        let storage = StorageClient::new(transport.clone(), metadata.clone());
        let tx = TxClient::new(transport.clone(), metadata.clone());
        let runtime_api = RuntimeApiClient::new(transport.clone(), metadata.clone());
        let blocks = Arc::new(BlockClient::new(transport.clone()));
        let weights = WeightsClient::new(transport.clone(), storage.clone(), tx.clone(), blocks.clone());

        Chain { transport, metadata, storage, tx, runtime_api, blocks, weights }
    }

    /// The decoded metadata this client resolved types/calls against.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The underlying transport, for diagnostics (`status`, `reconnect_count`).
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Direct access to the storage layer, for queries this facade doesn't
    /// name explicitly.
    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }

    /// Direct access to the extrinsic-composition/signing layer.
    pub fn tx(&self) -> &TxClient {
        &self.tx
    }

    /// Direct access to the weight commit/reveal client.
    pub fn weights(&self) -> &WeightsClient {
        &self.weights
    }

    /// Resolve a `(block, block_hash, reuse_block)` triple to a concrete
    /// block hash, honoring the same "at most one may be given" rule as
    /// `determine_block_hash`.
    pub async fn resolve_block(
        &self,
        block: Option<u64>,
        block_hash: Option<Hash>,
        reuse_block: bool,
    ) -> Result<Hash, Error> {
        let at = determine_block_ref(block, block_hash, reuse_block)?;
        self.blocks.resolve(at).await
    }

    /// The current chain head's block number.
    pub async fn get_current_block(&self) -> Result<u64, Error> {
        self.blocks.current_block().await
    }

    // ---- Balances --------------------------------------------------

    /// A single account's free balance.
    pub async fn get_balance(&self, account: &AccountId32, at: Option<Hash>) -> Result<Balance, Error> {
        Ok(self.get_balances(std::slice::from_ref(account), at).await?.remove(0))
    }

    /// Several accounts' free balances in one `state_queryStorageAt` round trip.
    pub async fn get_balances(&self, accounts: &[AccountId32], at: Option<Hash>) -> Result<Vec<Balance>, Error> {
        let keys: Vec<Vec<Vec<u8>>> = accounts.iter().map(|a| vec![a.encode()]).collect();
        let values = self.storage.query_multi("System", "Account", &keys, at).await?;
        Ok(values.into_iter().map(|v| v.map(|v| account_free_balance(&v)).unwrap_or(Balance::ZERO)).collect())
    }

    /// The chain's `Balances::ExistentialDeposit` constant.
    pub fn get_existential_deposit(&self) -> Result<Balance, Error> {
        let value = self.storage.get_constant("Balances", "ExistentialDeposit")?;
        Ok(Balance::from_rao(value_as_u128(&value).unwrap_or(0) as u64))
    }

    /// Estimate the fee for a `transfer_allow_death(dest, value)` extrinsic
    /// via `payment_queryInfo`, falling back to a literal 0.02 tao estimate
    /// if the dry run fails (§8 scenario 6).
    ///
    /// Dry-run fee estimation needs no private key - matching the original's
    /// `get_payment_info(call=call, keypair=wallet.coldkeypub)`, this builds
    /// an unsigned extrinsic (`sign_with = "coldkeypub"`) from `from`'s
    /// public account id alone.
    pub async fn get_transfer_fee(
        &self,
        from: &AccountId32,
        dest: &AccountId32,
        value: Balance,
        params: &TxParams,
    ) -> Result<Balance, Error> {
        let call = Call::new(
            "Balances",
            "transfer_allow_death",
            vec![multi_address_id(dest), Value::u128(value.rao() as u128)],
        );
        let extrinsic = match self.tx.sign_with(&call, "coldkeypub", SigningAccount::PublicOnly(from), params).await {
            Ok(bytes) => bytes,
            Err(_) => return Ok(Balance::from_rao(FALLBACK_TRANSFER_FEE_RAO)),
        };
        let hex_ext = format!("0x{}", hex::encode(&extrinsic));
        match self.transport.call_as::<PaymentQueryInfo>("payment_queryInfo", serde_json::json!([hex_ext])).await {
            Ok(info) => Ok(Balance::from_rao(info.partial_fee)),
            Err(_) => Ok(Balance::from_rao(FALLBACK_TRANSFER_FEE_RAO)),
        }
    }

    /// Submit a `Balances::transfer_allow_death` extrinsic.
    pub async fn transfer(&self, signer: &dyn Signer, dest: &AccountId32, value: Balance, params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new("Balances", "transfer_allow_death", vec![multi_address_id(dest), Value::u128(value.rao() as u128)]);
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    // ---- Neurons / subnets ------------------------------------------

    /// Every neuron on `netuid`, full detail.
    pub async fn neurons(&self, netuid: u16, at: Option<Hash>) -> Result<Vec<NeuronInfo>, Error> {
        self.runtime_api
            .call_decoded("NeuronInfoRuntimeApi", "get_neurons", &[netuid.encode()], at)
            .await?
            .ok_or(Error::SubnetNotFound(netuid))
    }

    /// Every neuron on `netuid`, omitting weight/bond matrices.
    pub async fn neurons_lite(&self, netuid: u16, at: Option<Hash>) -> Result<Vec<NeuronInfoLite>, Error> {
        self.runtime_api
            .call_decoded("NeuronInfoRuntimeApi", "get_neurons_lite", &[netuid.encode()], at)
            .await?
            .ok_or(Error::SubnetNotFound(netuid))
    }

    /// A single neuron's full record, if `uid` is registered on `netuid`.
    ///
    /// Dispatched as the bespoke `neuronInfo_getNeuron` RPC method directly
    /// (not through the runtime API layer) - the original calls this one
    /// via `rpc_request` rather than `query_runtime_api`.
    pub async fn neuron_for_uid(&self, netuid: u16, uid: u16, at: Option<Hash>) -> Result<Option<NeuronInfo>, Error> {
        let params = match at {
            Some(h) => serde_json::json!([netuid, uid, hex_encode_hash(h)]),
            None => serde_json::json!([netuid, uid]),
        };
        self.raw_rpc_decoded("neuronInfo_getNeuron", params).await
    }

    /// As [`Self::neuron_for_uid`], omitting weight/bond matrices.
    pub async fn neuron_for_uid_lite(&self, netuid: u16, uid: u16, at: Option<Hash>) -> Result<Option<NeuronInfoLite>, Error> {
        self.runtime_api.call_decoded("NeuronInfoRuntimeApi", "get_neuron_lite", &[netuid.encode(), uid.encode()], at).await
    }

    /// Every currently-registered subnet's full info.
    pub async fn get_all_subnets_info(&self, at: Option<Hash>) -> Result<Vec<SubnetInfo>, Error> {
        Ok(self
            .runtime_api
            .call_decoded("SubnetInfoRuntimeApi", "get_subnets_info", &[], at)
            .await?
            .unwrap_or_default())
    }

    /// Every currently-registered subnet's id.
    pub async fn get_subnets(&self, at: Option<Hash>) -> Result<Vec<u16>, Error> {
        Ok(self.get_all_subnets_info(at).await?.into_iter().map(|s| s.netuid).collect())
    }

    /// The total number of subnets ever created (including deregistered ones).
    pub async fn get_total_subnets(&self, at: Option<Hash>) -> Result<u16, Error> {
        let value = self.storage.get_or_default("SubtensorModule", "TotalNetworks", &[], at).await?;
        Ok(value_as_u128(&value).unwrap_or(0) as u16)
    }

    /// A subnet's tunable hyperparameters.
    pub async fn get_subnet_hyperparameters(&self, netuid: u16, at: Option<Hash>) -> Result<Option<SubnetHyperparams>, Error> {
        self.runtime_api.call_decoded("SubnetInfoRuntimeApi", "get_subnet_hyperparams", &[netuid.encode()], at).await
    }

    /// The current cost (in rao) to burn-register a new neuron on any subnet.
    pub async fn get_subnet_burn_cost(&self, at: Option<Hash>) -> Result<Balance, Error> {
        let cost: Option<u64> = self
            .runtime_api
            .call_decoded("SubnetRegistrationRuntimeApi", "get_network_registration_cost", &[], at)
            .await?;
        Ok(Balance::from_rao(cost.unwrap_or(0)))
    }

    // ---- Delegates / stake --------------------------------------------

    /// Every registered delegate's record.
    pub async fn get_delegates(&self, at: Option<Hash>) -> Result<Vec<DelegateInfo>, Error> {
        Ok(self.runtime_api.call_decoded("DelegateInfoRuntimeApi", "get_delegates", &[], at).await?.unwrap_or_default())
    }

    /// Delegates `coldkey` has nominated, paired with the staked amount.
    ///
    /// Dispatched as the bespoke `delegateInfo_getDelegated` RPC method
    /// directly (not through the runtime API layer), matching the original's
    /// `rpc_request` call site for this one query.
    pub async fn get_delegated(&self, coldkey: &AccountId32, at: Option<Hash>) -> Result<Vec<(DelegateInfo, Balance)>, Error> {
        let params = match at {
            Some(h) => serde_json::json!([format!("0x{}", hex::encode(coldkey.0)), hex_encode_hash(h)]),
            None => serde_json::json!([format!("0x{}", hex::encode(coldkey.0))]),
        };
        Ok(self.raw_rpc_decoded("delegateInfo_getDelegated", params).await?.unwrap_or_default())
    }

    /// All of `coldkey`'s stake positions, across hotkeys and subnets.
    pub async fn get_stake_info_for_coldkey(&self, coldkey: &AccountId32, at: Option<Hash>) -> Result<Vec<StakeInfo>, Error> {
        Ok(self
            .runtime_api
            .call_decoded("StakeInfoRuntimeApi", "get_stake_info_for_coldkey", &[coldkey.encode()], at)
            .await?
            .unwrap_or_default())
    }

    /// `hotkey`/`coldkey`'s staked amount on `netuid`, or zero if none.
    pub async fn get_stake_for_coldkey_and_hotkey(
        &self,
        hotkey: &AccountId32,
        coldkey: &AccountId32,
        netuid: u16,
        at: Option<Hash>,
    ) -> Result<Balance, Error> {
        let all: Vec<StakeInfo> = self
            .runtime_api
            .call_decoded("StakeInfoRuntimeApi", "get_stake_info_for_hotkey_coldkey", &[hotkey.encode(), coldkey.encode()], at)
            .await?
            .unwrap_or_default();
        Ok(all.into_iter().find(|s| s.netuid == netuid).map(|s| s.stake).unwrap_or(Balance::ZERO))
    }

    /// Stake `amount` from `coldkey` onto `hotkey` on `netuid`.
    pub async fn add_stake(&self, signer: &dyn Signer, hotkey: &AccountId32, netuid: u16, amount: Balance, params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new("SubtensorModule", "add_stake", vec![account_id_value(hotkey), Value::u128(netuid as u128), Value::u128(amount.rao() as u128)]);
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// Unstake `amount` from `hotkey` on `netuid`, back to the signer's coldkey.
    pub async fn unstake(&self, signer: &dyn Signer, hotkey: &AccountId32, netuid: u16, amount: Balance, params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new("SubtensorModule", "remove_stake", vec![account_id_value(hotkey), Value::u128(netuid as u128), Value::u128(amount.rao() as u128)]);
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// A coldkey's restricted-registration identity record, if it has set one.
    pub async fn query_identity(&self, coldkey: &AccountId32, at: Option<Hash>) -> Result<Option<IdentityInfo>, Error> {
        let Some(value) = self.storage.get("SubtensorModule", "IdentitiesV2", &[coldkey.encode()], at).await? else {
            return Ok(None);
        };
        Ok(Some(decode_identity(&value)))
    }

    /// Every coldkey with a recorded identity, keyed by coldkey.
    pub async fn get_delegate_identities(&self, at: Option<Hash>) -> Result<std::collections::HashMap<AccountId32, IdentityInfo>, Error> {
        let mut iter = self.storage.query_map("SubtensorModule", "IdentitiesV2", &[], at)?;
        let mut out = std::collections::HashMap::new();
        while let Some(entry) = iter.next().await? {
            let Some(Some(key_value)) = entry.key_parts.first() else { continue };
            let Ok(account) = <[u8; 32]>::try_from(value_as_bytes(key_value)) else { continue };
            out.insert(AccountId32(account), decode_identity(&entry.value));
        }
        Ok(out)
    }

    // ---- Hotkey / subnet membership ------------------------------------

    /// The coldkey that owns `hotkey`, if it's known to the chain.
    pub async fn get_hotkey_owner(&self, hotkey: &AccountId32, at: Option<Hash>) -> Result<Option<AccountId32>, Error> {
        let Some(value) = self.storage.get("SubtensorModule", "Owner", &[hotkey.encode()], at).await? else {
            return Ok(None);
        };
        let bytes = value_as_bytes(&value);
        let owner: [u8; 32] = bytes.try_into().map_err(|_| Error::Other("Owner storage value was not 32 bytes".to_owned()))?;
        // The pallet records an owner for every hotkey it has ever seen, but
        // reports the all-zero sentinel account for one that was never
        // actually registered; treat that sentinel as "no owner".
        if owner == [0u8; 32] {
            Ok(None)
        } else {
            Ok(Some(AccountId32(owner)))
        }
    }

    /// Whether `hotkey` is known to the chain (has a recorded, non-sentinel owner).
    pub async fn does_hotkey_exist(&self, hotkey: &AccountId32, at: Option<Hash>) -> Result<bool, Error> {
        Ok(self.get_hotkey_owner(hotkey, at).await?.is_some())
    }

    /// `hotkey`'s uid on `netuid`, if registered there.
    pub async fn get_uid_for_hotkey_on_subnet(&self, hotkey: &AccountId32, netuid: u16, at: Option<Hash>) -> Result<Option<u16>, Error> {
        let Some(value) = self.storage.get("SubtensorModule", "Uids", &[netuid.encode(), hotkey.encode()], at).await? else {
            return Ok(None);
        };
        Ok(value_as_u128(&value).map(|n| n as u16))
    }

    /// Every subnet `hotkey` is registered on.
    pub async fn get_netuids_for_hotkey(&self, hotkey: &AccountId32, at: Option<Hash>) -> Result<Vec<u16>, Error> {
        let mut iter = self.storage.query_map("SubtensorModule", "IsNetworkMember", &[hotkey.encode()], at)?;
        let mut netuids = Vec::new();
        while let Some(entry) = iter.next().await? {
            if !value_as_bool(&entry.value).unwrap_or(false) {
                continue;
            }
            if let Some(Some(netuid_value)) = entry.key_parts.last() {
                if let Some(n) = value_as_u128(netuid_value) {
                    netuids.push(n as u16);
                }
            }
        }
        Ok(netuids)
    }

    /// Whether `hotkey` is registered on `netuid`.
    pub async fn is_hotkey_registered(&self, hotkey: &AccountId32, netuid: u16, at: Option<Hash>) -> Result<bool, Error> {
        Ok(self.get_uid_for_hotkey_on_subnet(hotkey, netuid, at).await?.is_some())
    }

    /// Of `all_netuids`, those with at least one hotkey from `hotkeys` registered.
    pub async fn filter_netuids_by_registered_hotkeys(
        &self,
        all_netuids: &[u16],
        hotkeys: &[AccountId32],
        at: Option<Hash>,
    ) -> Result<Vec<u16>, Error> {
        let mut registered = std::collections::HashSet::new();
        for hotkey in hotkeys {
            for netuid in self.get_netuids_for_hotkey(hotkey, at).await? {
                registered.insert(netuid);
            }
        }
        Ok(all_netuids.iter().copied().filter(|n| registered.contains(n)).collect())
    }

    /// `(proportion, child hotkey)` pairs `hotkey` has delegated to on `netuid`.
    pub async fn get_children(&self, hotkey: &AccountId32, netuid: u16, at: Option<Hash>) -> Result<Vec<(u64, AccountId32)>, Error> {
        let Some(value) = self.storage.get("SubtensorModule", "ChildKeys", &[hotkey.encode(), netuid.encode()], at).await? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for pair in composite_values(match &value.value {
            scale_value::ValueDef::Composite(c) => c,
            _ => return Ok(Vec::new()),
        }) {
            let fields = composite_values(match &pair.value {
                scale_value::ValueDef::Composite(c) => c,
                _ => continue,
            });
            let Some(proportion) = fields.first().and_then(|v| value_as_u128(*v)) else { continue };
            let Some(child_bytes) = fields.get(1).map(|v| value_as_bytes(*v)) else { continue };
            let Ok(child) = <[u8; 32]>::try_from(child_bytes) else { continue };
            out.push((proportion as u64, AccountId32(child)));
        }
        Ok(out)
    }

    // ---- Consensus / misc ------------------------------------------

    /// Whether commit-reveal weight submission is enabled for `netuid`.
    pub async fn commit_reveal_enabled(&self, netuid: u16, at: Option<Hash>) -> Result<bool, Error> {
        self.weights.commit_reveal_enabled(netuid, at).await
    }

    /// `netuid`'s `Tempo` hyperparameter.
    pub async fn tempo(&self, netuid: u16, at: Option<Hash>) -> Result<u64, Error> {
        self.weights.tempo(netuid, at).await
    }

    /// `netuid`'s `WeightsSetRateLimit` hyperparameter.
    pub async fn weights_rate_limit(&self, netuid: u16, at: Option<Hash>) -> Result<u64, Error> {
        self.weights.weights_rate_limit(netuid, at).await
    }

    /// Blocks since `uid` last had its weights updated on `netuid`.
    pub async fn blocks_since_last_update(&self, netuid: u16, uid: u16, at: Option<Hash>) -> Result<u64, Error> {
        self.weights.blocks_since_last_update(netuid, uid, at).await
    }

    /// Pending CRV3 weight commits for `netuid` (first map entry only; see
    /// [`WeightsClient::current_weight_commit_info`]).
    pub async fn get_current_weight_commit_info(&self, netuid: u16, at: Option<Hash>) -> Result<Vec<WeightCommitInfo>, Error> {
        self.weights.current_weight_commit_info(netuid, at).await
    }

    /// Submit a legacy (non-commit-reveal) `set_weights` extrinsic.
    pub async fn set_weights(
        &self,
        signer: &dyn Signer,
        netuid: u16,
        uids: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        params: &TxParams,
    ) -> Result<Hash, Error> {
        self.weights.set_weights(signer, netuid, uids, weights, version_key, params).await
    }

    /// Drive a commit-reveal weight submission in the background; see
    /// [`WeightsClient::spawn_set_weights`].
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_set_weights<S: Signer + Send + Sync + 'static>(
        &self,
        signer: Arc<S>,
        netuid: u16,
        uid: u16,
        uids: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        params: TxParams,
        max_retries: u32,
    ) -> tokio::sync::watch::Receiver<WeightCommitState> {
        self.weights.clone().spawn_set_weights(signer, netuid, uid, uids, weights, version_key, params, max_retries)
    }

    /// Submit the root-network `set_root_weights` extrinsic.
    pub async fn root_set_weights(
        &self,
        signer: &dyn Signer,
        netuids: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        params: &TxParams,
    ) -> Result<Hash, Error> {
        let call = Call::new(
            "SubtensorModule",
            "set_root_weights",
            vec![u16_list_value(&netuids), u16_list_value(&weights), Value::u128(version_key as u128)],
        );
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// Submit a proof-of-work registration. PoW computation itself (finding
    /// `nonce`/`work`) remains an external collaborator's job (§1 Non-goal);
    /// this only submits an already-solved attempt.
    pub async fn register(
        &self,
        signer: &dyn Signer,
        netuid: u16,
        block_number: u64,
        nonce: u64,
        work: Vec<u8>,
        hotkey: &AccountId32,
        coldkey: &AccountId32,
        params: &TxParams,
    ) -> Result<Hash, Error> {
        let call = Call::new(
            "SubtensorModule",
            "register",
            vec![
                Value::u128(netuid as u128),
                Value::u128(block_number as u128),
                Value::u128(nonce as u128),
                Value::unnamed_composite(work.iter().map(|b| Value::u128(*b as u128)).collect()),
                account_id_value(hotkey),
                account_id_value(coldkey),
            ],
        );
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// Register `hotkey` on `netuid` by burning the subnet's current registration cost.
    pub async fn burned_register(&self, signer: &dyn Signer, netuid: u16, hotkey: &AccountId32, params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new("SubtensorModule", "burned_register", vec![Value::u128(netuid as u128), account_id_value(hotkey)]);
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// Register `hotkey` on the root network (netuid 0).
    pub async fn root_register(&self, signer: &dyn Signer, hotkey: &AccountId32, params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new("SubtensorModule", "root_register", vec![account_id_value(hotkey)]);
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// Advertise `axon`'s address for the signer's hotkey on `netuid`.
    pub async fn serve_axon(&self, signer: &dyn Signer, netuid: u16, axon: &AxonInfo, params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new(
            "SubtensorModule",
            "serve_axon",
            vec![
                Value::u128(netuid as u128),
                Value::u128(axon.version as u128),
                Value::u128(axon.ip),
                Value::u128(axon.port as u128),
                Value::u128(axon.ip_type as u128),
                Value::u128(axon.protocol as u128),
                Value::u128(axon.placeholder1 as u128),
                Value::u128(axon.placeholder2 as u128),
            ],
        );
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    /// Commit an arbitrary metadata blob under the signer's hotkey for
    /// `netuid`, mirroring `publish_metadata`'s distinct import from
    /// `serve_axon_extrinsic` (it composes a separate `Commitments` call
    /// rather than an `Axon` record).
    pub async fn publish_metadata(&self, signer: &dyn Signer, netuid: u16, data: &[u8], params: &TxParams) -> Result<Hash, Error> {
        let call = Call::new(
            "Commitments",
            "set_commitment",
            vec![
                Value::u128(netuid as u128),
                Value::unnamed_composite(data.iter().map(|b| Value::u128(*b as u128)).collect()),
            ],
        );
        self.tx.sign_and_send(&call, signer, params).await?.wait_for_finalized_success().await
    }

    // ---- Governance / misc reads -----------------------------------

    /// The most recently observed Drand randomness beacon round.
    pub async fn last_drand_round(&self, at: Option<Hash>) -> Result<Option<u64>, Error> {
        let Some(value) = self.storage.get("Drand", "LastStoredRound", &[], at).await? else {
            return Ok(None);
        };
        Ok(value_as_u128(&value).map(|n| n as u64))
    }

    /// A senate proposal's recorded vote tally, if the proposal hash is known.
    pub async fn get_vote_data(&self, proposal_hash: Hash, at: Option<Hash>) -> Result<Option<ProposalVoteData>, Error> {
        let Some(value) = self.storage.get("Triumvirate", "Voting", &[proposal_hash.encode()], at).await? else {
            return Ok(None);
        };
        let fields = composite_values(match &value.value {
            scale_value::ValueDef::Composite(c) => c,
            _ => return Ok(None),
        });
        let index = fields.first().and_then(|v| value_as_u128(*v)).unwrap_or(0) as u32;
        let threshold = fields.get(1).and_then(|v| value_as_u128(*v)).unwrap_or(0) as u32;
        let ayes = fields.get(2).map(|v| decode_account_list(*v)).unwrap_or_default();
        let nays = fields.get(3).map(|v| decode_account_list(*v)).unwrap_or_default();
        let end = fields.get(4).and_then(|v| value_as_u128(*v)).unwrap_or(0) as u64;
        Ok(Some(ProposalVoteData { index, threshold, ayes, nays, end }))
    }

    /// Dispatch `method` straight through the transport as a plain RPC call
    /// (not via `state_call`), decoding its hex-encoded SCALE result as `T`.
    /// Grounded on the original's `rpc_request(method=..., params=[...])`
    /// call sites for `delegateInfo_getDelegate(d)`/`getDelegated`/
    /// `neuronInfo_getNeuron` (§6).
    async fn raw_rpc_decoded<T: codec::Decode>(&self, method: &str, params: serde_json::Value) -> Result<Option<T>, Error> {
        let result_hex: String = self.transport.call_as(method, params).await?;
        let bytes = hex_decode(&result_hex)?;
        if bytes.is_empty() || bytes.as_slice() == [0u8] {
            return Ok(None);
        }
        Ok(Some(T::decode(&mut &bytes[..]).map_err(Error::from)?))
    }
}

fn hex_encode_hash(hash: Hash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

/// Positionally decodes a `(name, url, description, image, discord, ...)`
/// identity record. The trailing `additional` `(key, value)` list isn't
/// decoded (self-designed simplification, see DESIGN.md).
fn decode_identity<T>(value: &Value<T>) -> IdentityInfo {
    let fields = match &value.value {
        scale_value::ValueDef::Composite(c) => composite_values(c),
        _ => Vec::new(),
    };
    IdentityInfo {
        name: fields.first().map(|v| value_as_bytes(*v)).unwrap_or_default(),
        url: fields.get(1).map(|v| value_as_bytes(*v)).unwrap_or_default(),
        description: fields.get(2).map(|v| value_as_bytes(*v)).unwrap_or_default(),
        image: fields.get(3).map(|v| value_as_bytes(*v)).unwrap_or_default(),
        discord: fields.get(4).map(|v| value_as_bytes(*v)).unwrap_or_default(),
        additional: Vec::new(),
    }
}

/// A senate proposal's recorded vote tally.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalVoteData {
    /// The proposal's index in the senate's proposal list.
    pub index: u32,
    /// Votes required for the proposal to pass.
    pub threshold: u32,
    /// Senate members who voted in favor.
    pub ayes: Vec<AccountId32>,
    /// Senate members who voted against.
    pub nays: Vec<AccountId32>,
    /// Block at which voting closes.
    pub end: u64,
}

fn decode_account_list<T>(value: &Value<T>) -> Vec<AccountId32> {
    let c = match &value.value {
        scale_value::ValueDef::Composite(c) => c,
        _ => return Vec::new(),
    };
    composite_values(c)
        .into_iter()
        .filter_map(|v| <[u8; 32]>::try_from(value_as_bytes(v)).ok())
        .map(AccountId32)
        .collect()
}

/// `value`'s free balance field, per `System::Account`'s `(nonce, consumers,
/// providers, sufficients, data)` shape where `data`'s first field is `free`
/// (stable across the `misc_frozen`/`fee_frozen` vs. single-`frozen` layouts
/// substrate has used over time).
fn account_free_balance<T>(value: &Value<T>) -> Balance {
    let top = match &value.value {
        scale_value::ValueDef::Composite(c) => composite_values(c),
        _ => return Balance::ZERO,
    };
    let Some(data) = top.last() else { return Balance::ZERO };
    let data_fields = match &data.value {
        scale_value::ValueDef::Composite(c) => composite_values(c),
        _ => return Balance::ZERO,
    };
    Balance::from_rao(data_fields.first().and_then(|v| value_as_u128(*v)).unwrap_or(0) as u64)
}

fn account_id_value(id: &AccountId32) -> Value<()> {
    Value::unnamed_composite(id.0.iter().map(|b| Value::u128(*b as u128)).collect())
}

/// `MultiAddress::Id(account)`, the shape `Balances` calls expect their
/// address-typed parameters in on a standard Substrate runtime.
fn multi_address_id(id: &AccountId32) -> Value<()> {
    Value::variant("Id", scale_value::Composite::Unnamed(vec![account_id_value(id)]))
}

fn u16_list_value(xs: &[u16]) -> Value<()> {
    Value::unnamed_composite(xs.iter().map(|x| Value::u128(*x as u128)).collect())
}

#[derive(serde::Deserialize)]
struct PaymentQueryInfo {
    #[serde(rename = "partialFee", deserialize_with = "deserialize_fee")]
    partial_fee: u64,
}

fn deserialize_fee<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum FeeValue {
        Number(u64),
        Text(String),
    }
    match FeeValue::deserialize(deserializer)? {
        FeeValue::Number(n) => Ok(n),
        FeeValue::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn hex_decode(s: &str) -> Result<Vec<u8>, Error> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| Error::Other(format!("invalid hex in RPC response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_free_balance_reads_first_data_field() {
        let account = Value::unnamed_composite(vec![
            Value::u128(1),
            Value::u128(0),
            Value::u128(0),
            Value::u128(0),
            Value::unnamed_composite(vec![Value::u128(500), Value::u128(0), Value::u128(0)]),
        ]);
        assert_eq!(account_free_balance(&account), Balance::from_rao(500));
    }

    #[test]
    fn multi_address_id_wraps_account_bytes() {
        let id = AccountId32([9u8; 32]);
        match multi_address_id(&id).value {
            scale_value::ValueDef::Variant(v) => assert_eq!(v.name, "Id"),
            other => panic!("expected a variant, got {other:?}"),
        }
    }

    #[test]
    fn decode_account_list_reads_fixed_width_entries() {
        let list = Value::unnamed_composite(vec![
            Value::unnamed_composite((0u8..32).map(|b| Value::u128(b as u128)).collect()),
        ]);
        let accounts = decode_account_list(&list);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].0[5], 5);
    }

    #[test]
    fn payment_query_info_accepts_either_fee_encoding() {
        let from_text: PaymentQueryInfo = serde_json::from_value(serde_json::json!({
            "partialFee": "369000000",
        }))
        .unwrap();
        assert_eq!(from_text.partial_fee, 369_000_000);

        let from_number: PaymentQueryInfo = serde_json::from_value(serde_json::json!({
            "partialFee": 369_000_000u64,
        }))
        .unwrap();
        assert_eq!(from_number.partial_fee, 369_000_000);
    }

    #[derive(scale_info::TypeInfo)]
    enum TestMultiAddress {
        Id([u8; 32]),
    }

    /// A `Metadata` exposing exactly `Balances::transfer_allow_death(dest, value)`,
    /// real enough for [`TxClient::encode_call`] to succeed against it.
    fn transfer_allow_death_metadata() -> Metadata {
        let mut registry = scale_info::Registry::new();
        let dest_ty = registry.register_type(&scale_info::meta_type::<TestMultiAddress>()).id;
        let value_ty = registry.register_type(&scale_info::meta_type::<u128>()).id;
        let types: scale_info::PortableRegistry = registry.into();

        Metadata::for_test_single_call(
            "Balances",
            5,
            "transfer_allow_death",
            0,
            vec![(Some("dest".to_owned()), dest_ty), (Some("value".to_owned()), value_ty)],
            types,
        )
    }

    /// Accept one WebSocket connection and answer every JSON-RPC call on it
    /// with the given error, returning the address to connect to.
    async fn spawn_erroring_rpc_server() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = futures::StreamExt::next(&mut ws).await {
                let tokio_tungstenite::tungstenite::Message::Text(text) = msg else { continue };
                let req: serde_json::Value = serde_json::from_str(&text).unwrap();
                let resp = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": req["id"],
                    "error": {"code": -32603, "message": "mock RPC failure"},
                });
                let _ = futures::SinkExt::send(
                    &mut ws,
                    tokio_tungstenite::tungstenite::Message::Text(resp.to_string()),
                )
                .await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn transfer_fee_falls_back_to_the_literal_estimate_on_rpc_failure() {
        let addr = spawn_erroring_rpc_server().await;
        let transport = Transport::connect(format!("ws://{addr}")).await.unwrap();
        let metadata = transfer_allow_death_metadata();
        let chain = Chain::from_parts(transport, metadata);

        let from = AccountId32([1u8; 32]);
        let dest = AccountId32([2u8; 32]);
        let fee = chain
            .get_transfer_fee(&from, &dest, Balance::from_rao(1_000), &crate::tx::TxParams::default())
            .await
            .unwrap();

        assert_eq!(fee, Balance::from_rao(FALLBACK_TRANSFER_FEE_RAO));
    }
}
