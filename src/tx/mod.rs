//! Component G: extrinsic composition, signing, submission, and progress
//! tracking.
//!
//! Call/extrinsic assembly is grounded directly on the wire format built in
//! `subxt`'s (older-vintage) `extrinsic/tx_client.rs::create_signed_with_nonce`:
//! a V4 unchecked extrinsic is `Compact(len) ++ (0b1000_0000 | 4) ++ address
//! ++ signature ++ extra ++ call_data`, where `extra`/`additional` are the
//! signed-extension tuple encoded per `extrinsic/extra.rs`'s `DefaultExtra`.
//! The `TxStatus`/`TxProgress`/`TxInBlock` state machine mirrors
//! `tx/tx_progress.rs`.

pub mod signer;

use std::collections::HashMap;
use std::sync::Arc;

use codec::{Compact, Encode};
use scale_value::Value;
use tokio::sync::Mutex as AsyncMutex;

use crate::codec::{composite_values, find_variant, value_as_bytes, value_as_u128, variant_composite, variant_name, DecodedValue};
use crate::config::{AccountId32, Hash, MultiSignature};
use crate::error::{ArithmeticError, DispatchError, Error, ModuleError, TokenError, TransactionalError};
use crate::metadata::Metadata;
use crate::rpc::Transport;
use crate::tx::signer::{SignWith, Signer, SigningAccount};

pub use era::Era;

/// One extrinsic call: a pallet/call name pair plus positional, already
/// dynamically-typed arguments, encoded against the call's declared field
/// types from metadata.
#[derive(Clone, Debug)]
pub struct Call {
    /// The pallet this call belongs to (e.g. `"SubtensorModule"`).
    pub pallet: String,
    /// The call's variant name (e.g. `"add_stake"`).
    pub call: String,
    /// Positional arguments, in declaration order.
    pub args: Vec<Value<()>>,
}

impl Call {
    /// Construct a call with the given pallet/call names and arguments.
    pub fn new(pallet: impl Into<String>, call: impl Into<String>, args: Vec<Value<()>>) -> Self {
        Call { pallet: pallet.into(), call: call.into(), args }
    }
}

/// Tip and mortality knobs for a submitted extrinsic; everything else
/// (nonce, spec/transaction version, genesis hash) is filled in from chain
/// state at submission time.
#[derive(Clone, Debug)]
pub struct TxParams {
    /// Tip offered to the block author, in the chain's smallest unit.
    pub tip: u128,
    /// Mortality: `None` for an immortal transaction.
    pub mortality: Option<Mortality>,
}

impl Default for TxParams {
    fn default() -> Self {
        TxParams { tip: 0, mortality: None }
    }
}

/// A mortal transaction's validity window.
#[derive(Clone, Copy, Debug)]
pub struct Mortality {
    /// Roughly how many blocks the transaction remains valid for.
    pub period: u64,
    /// The block number the period is anchored at.
    pub current_block: u64,
    /// The hash of `current_block`, included in the signed payload.
    pub checkpoint: Hash,
}

/// A client for composing, signing, and submitting extrinsics.
#[derive(Clone)]
pub struct TxClient {
    transport: Transport,
    metadata: Metadata,
    nonce_locks: Arc<std::sync::Mutex<HashMap<AccountId32, Arc<AsyncMutex<()>>>>>,
}

impl TxClient {
    /// Construct a transaction client over the given transport and metadata.
    pub fn new(transport: Transport, metadata: Metadata) -> Self {
        TxClient { transport, metadata, nonce_locks: Arc::new(std::sync::Mutex::new(HashMap::new())) }
    }

    /// Encode a [`Call`] as `pallet_index ++ call_index ++ fields`, the shape
    /// a pallet's outer `Call` enum expects.
    pub fn encode_call(&self, call: &Call) -> Result<Vec<u8>, Error> {
        let entry = self.metadata.call_entry(&call.pallet, &call.call)?;
        if call.args.len() != entry.fields.len() {
            return Err(Error::Other(format!(
                "{}.{} expects {} arguments, got {}",
                call.pallet,
                call.call,
                entry.fields.len(),
                call.args.len()
            )));
        }
        let mut bytes = vec![entry.pallet_index, entry.call_index];
        for (arg, (_, ty)) in call.args.iter().zip(entry.fields.iter()) {
            crate::codec::encode_value(arg, *ty, &self.metadata, &mut bytes)?;
        }
        Ok(bytes)
    }

    /// Fetch the next nonce to use for `account`, guarded so only one
    /// in-flight submission per account can be mid-flight at a time (§9
    /// Open Question: nonce acquisition is serialized per signer to avoid
    /// two concurrent submissions racing on the same nonce).
    async fn next_nonce(&self, account: &AccountId32) -> Result<u64, Error> {
        self.transport.call_as("system_accountNextIndex", serde_json::json!([account])).await.map_err(Error::from)
    }

    fn account_lock(&self, account: &AccountId32) -> Arc<AsyncMutex<()>> {
        self.nonce_locks
            .lock()
            .unwrap()
            .entry(account.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn runtime_version(&self) -> Result<(u32, u32), Error> {
        let rv: RuntimeVersion = self.transport.call_as("state_getRuntimeVersion", serde_json::json!([])).await?;
        Ok((rv.spec_version, rv.transaction_version))
    }

    async fn genesis_hash(&self) -> Result<Hash, Error> {
        self.transport.call_as("chain_getBlockHash", serde_json::json!([0])).await.map_err(Error::from)
    }

    /// Sign `call` with `signer`, serialized per-account on nonce
    /// acquisition, and return the raw extrinsic bytes.
    pub async fn sign(&self, call: &Call, signer: &dyn Signer, params: &TxParams) -> Result<Vec<u8>, Error> {
        let lock = self.account_lock(signer.account_id());
        let _guard = lock.lock().await;

        let nonce = self.next_nonce(signer.account_id()).await?;
        let (spec_version, transaction_version) = self.runtime_version().await?;
        let genesis_hash = self.genesis_hash().await?;

        let (era, checkpoint) = match &params.mortality {
            Some(m) => (Era::mortal(m.period, m.current_block), m.checkpoint),
            None => (Era::Immortal, genesis_hash),
        };

        let call_data = self.encode_call(call)?;

        let mut extra = Vec::new();
        era.encode_to(&mut extra);
        Compact(nonce).encode_to(&mut extra);
        Compact(params.tip).encode_to(&mut extra);

        let mut additional = Vec::new();
        spec_version.encode_to(&mut additional);
        transaction_version.encode_to(&mut additional);
        genesis_hash.encode_to(&mut additional);
        checkpoint.encode_to(&mut additional);

        let mut payload = Vec::new();
        payload.extend_from_slice(&call_data);
        payload.extend_from_slice(&extra);
        payload.extend_from_slice(&additional);

        let signature = if payload.len() > 256 {
            signer.sign(&sp_crypto_hashing::blake2_256(&payload))
        } else {
            signer.sign(&payload)
        };

        let mut body = Vec::new();
        // "is signed" bit set, protocol version 4.
        (0b1000_0000u8 | 4u8).encode_to(&mut body);
        signer_address(signer.account_id()).encode_to(&mut body);
        signature.encode_to(&mut body);
        body.extend_from_slice(&extra);
        body.extend_from_slice(&call_data);

        let mut extrinsic = Vec::new();
        Compact(u32::try_from(body.len()).expect("extrinsic body under 4GiB")).encode_to(&mut extrinsic);
        extrinsic.extend_from_slice(&body);
        Ok(extrinsic)
    }

    /// Build `call`'s wire extrinsic for the given `sign_with` role
    /// (`"coldkey"`, `"hotkey"`, or `"coldkeypub"`). `sign_with` is parsed
    /// and validated before any I/O, so an invalid value fails synchronously
    /// without touching the network. `coldkey`/`hotkey` need a
    /// private-key-backed [`SigningAccount::Signer`] and produce a fully
    /// signed extrinsic; `coldkeypub` only needs the public account id and
    /// always produces an unsigned one, since there is no private key to
    /// sign with.
    pub async fn sign_with(
        &self,
        call: &Call,
        sign_with: &str,
        account: SigningAccount<'_>,
        params: &TxParams,
    ) -> Result<Vec<u8>, Error> {
        let sign_with: SignWith = sign_with.parse()?;
        match (sign_with, account) {
            (SignWith::ColdkeyPub, account) => self.build_unsigned(call, account.account_id()),
            (SignWith::Coldkey | SignWith::Hotkey, SigningAccount::Signer(signer)) => {
                self.sign(call, signer, params).await
            }
            (SignWith::Coldkey | SignWith::Hotkey, SigningAccount::PublicOnly(id)) => Err(Error::SigningFailed(
                format!("sign_with requires a private-key-backed signer for account {id:?}"),
            )),
        }
    }

    /// Build an unsigned V4 extrinsic (`Compact(len) ++ 4 ++ call_data`, no
    /// address/signature/extra): no nonce, era, or signature is needed, so
    /// this never touches the network. Used for dry-run fee estimation
    /// (`coldkeypub`, which has no private key to sign with).
    fn build_unsigned(&self, call: &Call, _account: &AccountId32) -> Result<Vec<u8>, Error> {
        let call_data = self.encode_call(call)?;

        let mut body = Vec::new();
        // No "is signed" bit, protocol version 4.
        4u8.encode_to(&mut body);
        body.extend_from_slice(&call_data);

        let mut extrinsic = Vec::new();
        Compact(u32::try_from(body.len()).expect("extrinsic body under 4GiB")).encode_to(&mut extrinsic);
        extrinsic.extend_from_slice(&body);
        Ok(extrinsic)
    }

    /// Sign and submit `call`, returning a [`TxProgress`] subscribed to its
    /// lifecycle via `author_submitAndWatchExtrinsic`.
    pub async fn sign_and_send(
        &self,
        call: &Call,
        signer: &dyn Signer,
        params: &TxParams,
    ) -> Result<TxProgress, Error> {
        let extrinsic = self.sign(call, signer, params).await?;
        let ext_hash = sp_crypto_hashing::blake2_256(&extrinsic);
        let hex_ext = format!("0x{}", hex::encode(&extrinsic));

        let sub = self
            .transport
            .subscribe(
                "author_submitAndWatchExtrinsic",
                serde_json::json!([hex_ext]),
                "author_unwatchExtrinsic",
            )
            .await?;

        Ok(TxProgress { sub, ext_hash, metadata: self.metadata.clone(), transport: self.transport.clone(), done: false })
    }
}

/// A signer's address is just its account id for this chain (no multi-address enum).
fn signer_address(account_id: &AccountId32) -> &AccountId32 {
    account_id
}

#[derive(serde::Deserialize)]
struct RuntimeVersion {
    #[serde(rename = "specVersion")]
    spec_version: u32,
    #[serde(rename = "transactionVersion")]
    transaction_version: u32,
}

mod era {
    use codec::{Decode, Encode};

    /// An extrinsic's mortality, encoded exactly as `sp_runtime::generic::Era`.
    #[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
    pub enum Era {
        /// Valid forever; the genesis hash is the signed checkpoint.
        #[default]
        Immortal,
        /// Valid for `period` blocks starting near `phase`.
        Mortal {
            /// Number of blocks the tx remains valid for.
            period: u64,
            /// Phase within the period identifying the checkpoint block.
            phase: u64,
        },
    }

    impl Era {
        /// Build a mortal era for `period` blocks starting at `current`.
        pub fn mortal(period: u64, current: u64) -> Self {
            let period = period.checked_next_power_of_two().unwrap_or(1 << 16).clamp(4, 1 << 16);
            let phase = current % period;
            let quantize_factor = (period >> 12).max(1);
            let quantized_phase = phase / quantize_factor * quantize_factor;
            Era::Mortal { period, phase: quantized_phase }
        }
    }

    impl Encode for Era {
        fn encode_to<T: codec::Output + ?Sized>(&self, output: &mut T) {
            match self {
                Era::Immortal => output.push_byte(0),
                Era::Mortal { period, phase } => {
                    let quantize_factor = (*period >> 12).max(1);
                    let encoded = (period.trailing_zeros() - 1).clamp(1, 15) as u16
                        | ((phase / quantize_factor) << 4) as u16;
                    encoded.encode_to(output);
                }
            }
        }
    }

    impl Decode for Era {
        fn decode<I: codec::Input>(input: &mut I) -> Result<Self, codec::Error> {
            let first = input.read_byte()?;
            if first == 0 {
                Ok(Era::Immortal)
            } else {
                let encoded = first as u64 + ((input.read_byte()? as u64) << 8);
                let period = 2 << (encoded % (1 << 4));
                let quantize_factor = (period >> 12).max(1);
                let phase = (encoded >> 4) * quantize_factor;
                if period >= 4 && phase < period {
                    Ok(Era::Mortal { period, phase })
                } else {
                    Err("invalid era period/phase".into())
                }
            }
        }
    }
}

/// Possible statuses of a submitted extrinsic, observed over
/// `author_submitAndWatchExtrinsic`. Mirrors the well-known Substrate
/// transaction-pool status lifecycle.
#[derive(Clone, Debug)]
pub enum TxStatus {
    /// Not yet valid to enter the ready queue.
    Future,
    /// In the ready queue.
    Ready,
    /// Broadcast to the given peers.
    Broadcast(Vec<String>),
    /// Included in a block (not necessarily finalized).
    InBlock(Hash),
    /// The including block was retracted (may still reappear later).
    Retracted(Hash),
    /// A block containing it did not reach finality within 512 blocks.
    FinalityTimeout(Hash),
    /// Finalized by the finality gadget.
    Finalized(Hash),
    /// Replaced in the pool by a transaction with the same sender/nonce.
    Usurped(Hash),
    /// Dropped from the pool (e.g. pool full).
    Dropped,
    /// No longer valid in the current state.
    Invalid,
}

/// A subscription tracking a submitted extrinsic's progress.
pub struct TxProgress {
    sub: crate::rpc::Subscription,
    ext_hash: [u8; 32],
    metadata: Metadata,
    transport: Transport,
    done: bool,
}

impl TxProgress {
    /// The blake2_256 hash of the submitted extrinsic.
    pub fn extrinsic_hash(&self) -> [u8; 32] {
        self.ext_hash
    }

    /// Wait for the next status update, or `None` once the subscription has
    /// reached a terminal state (`Finalized`/`FinalityTimeout`) or closed.
    pub async fn next_item(&mut self) -> Option<Result<TxStatus, Error>> {
        if self.done {
            return None;
        }
        let raw = self.sub.next().await?;
        let value = match raw {
            Ok(v) => v,
            Err(e) => return Some(Err(e.into())),
        };
        let status = match parse_tx_status(&value) {
            Ok(s) => s,
            Err(e) => return Some(Err(e)),
        };
        if matches!(status, TxStatus::Finalized(_) | TxStatus::FinalityTimeout(_)) {
            self.done = true;
        }
        Some(Ok(status))
    }

    /// Wait until the extrinsic is included in a block (ignoring
    /// `Invalid`/`Usurped`/`Dropped` along the way, since forks can still
    /// carry it into a finalized chain later).
    pub async fn wait_for_in_block(mut self) -> Result<TxInBlock, Error> {
        while let Some(status) = self.next_item().await {
            match status? {
                TxStatus::InBlock(hash) | TxStatus::Finalized(hash) => {
                    return Ok(TxInBlock { block_hash: hash, ext_hash: self.ext_hash, metadata: self.metadata, transport: self.transport })
                }
                TxStatus::FinalityTimeout(_) => return Err(crate::error::TransactionError::FinalitySubscriptionTimeout.into()),
                _ => continue,
            }
        }
        Err(crate::error::RpcError::SubscriptionDropped.into())
    }

    /// Wait until the extrinsic's block is finalized.
    pub async fn wait_for_finalized(mut self) -> Result<TxInBlock, Error> {
        while let Some(status) = self.next_item().await {
            match status? {
                TxStatus::Finalized(hash) => {
                    return Ok(TxInBlock { block_hash: hash, ext_hash: self.ext_hash, metadata: self.metadata, transport: self.transport })
                }
                TxStatus::FinalityTimeout(_) => return Err(crate::error::TransactionError::FinalitySubscriptionTimeout.into()),
                _ => continue,
            }
        }
        Err(crate::error::RpcError::SubscriptionDropped.into())
    }

    /// Wait for finalization, then confirm the extrinsic didn't dispatch a
    /// `System.ExtrinsicFailed` error.
    pub async fn wait_for_finalized_success(self) -> Result<Hash, Error> {
        let in_block = self.wait_for_finalized().await?;
        in_block.wait_for_success().await
    }
}

/// An extrinsic that has been included in a (not necessarily finalized) block.
pub struct TxInBlock {
    block_hash: Hash,
    ext_hash: [u8; 32],
    metadata: Metadata,
    transport: Transport,
}

impl TxInBlock {
    /// The hash of the block the extrinsic was included in.
    pub fn block_hash(&self) -> Hash {
        self.block_hash
    }

    /// The blake2_256 hash of the submitted extrinsic.
    pub fn extrinsic_hash(&self) -> [u8; 32] {
        self.ext_hash
    }

    /// Confirm the extrinsic succeeded: fetch this block's events and fail
    /// if a `System.ExtrinsicFailed` event decodes with a matching cause.
    ///
    /// This only inspects whether *any* extrinsic in the block failed,
    /// since correlating a specific extrinsic index requires re-fetching
    /// and re-hashing the block body (component F); callers needing that
    /// precision should use `fetch_events` directly once block bodies are
    /// exposed by a richer chain facade.
    pub async fn wait_for_success(&self) -> Result<Hash, Error> {
        let changes: StorageChangeSet = self
            .transport
            .call_as(
                "state_queryStorageAt",
                serde_json::json!([[system_events_key()], hex_hash(self.block_hash)]),
            )
            .await
            .map(|mut v: Vec<StorageChangeSet>| v.remove(0))?;

        for (_, maybe_value) in changes.changes {
            let Some(hex_value) = maybe_value else { continue };
            let bytes = hex_decode(&hex_value)?;
            if let Some(dispatch_error) = find_extrinsic_failed(&bytes, &self.metadata)? {
                return Err(dispatch_error.into());
            }
        }
        Ok(self.block_hash)
    }
}

#[derive(serde::Deserialize)]
struct StorageChangeSet {
    #[allow(dead_code)]
    block: String,
    changes: Vec<(String, Option<String>)>,
}

fn system_events_key() -> String {
    let mut key = sp_crypto_hashing::twox_128(b"System").to_vec();
    key.extend_from_slice(&sp_crypto_hashing::twox_128(b"Events"));
    format!("0x{}", hex::encode(key))
}

fn hex_hash(hash: Hash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

fn hex_decode(s: &str) -> Result<Vec<u8>, Error> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| Error::Other(format!("invalid hex in RPC response: {e}")))
}

/// Scan a SCALE-encoded `Vec<EventRecord>` for a `System::ExtrinsicFailed`
/// event and decode its `DispatchError` field, per §4.G.
fn find_extrinsic_failed(event_bytes: &[u8], metadata: &Metadata) -> Result<Option<DispatchError>, Error> {
    let entry = metadata.storage_entry("System", "Events")?;
    let events = crate::codec::decode_value(&mut &*event_bytes, entry.value_ty, metadata)?;
    Ok(find_variant(&events, "ExtrinsicFailed")
        .and_then(|v| composite_values(variant_composite(v)?).into_iter().next())
        .map(|v| dispatch_error_from_value(v, metadata)))
}

fn dispatch_error_from_value(value: &DecodedValue, metadata: &Metadata) -> DispatchError {
    let Some(name) = variant_name(value) else {
        return DispatchError::Unknown(Vec::new());
    };
    let fields = variant_composite(value).map(composite_values).unwrap_or_default();
    match name {
        "Other" => DispatchError::Other,
        "CannotLookup" => DispatchError::CannotLookup,
        "BadOrigin" => DispatchError::BadOrigin,
        "ConsumerRemaining" => DispatchError::ConsumerRemaining,
        "NoProviders" => DispatchError::NoProviders,
        "TooManyConsumers" => DispatchError::TooManyConsumers,
        "Exhausted" => DispatchError::Exhausted,
        "Corruption" => DispatchError::Corruption,
        "Unavailable" => DispatchError::Unavailable,
        "Module" => module_error_from_fields(&fields, metadata),
        "Token" => DispatchError::Token(token_error_from_fields(&fields)),
        "Arithmetic" => DispatchError::Arithmetic(arithmetic_error_from_fields(&fields)),
        "Transactional" => DispatchError::Transactional(transactional_error_from_fields(&fields)),
        _ => DispatchError::Unknown(Vec::new()),
    }
}

fn module_error_from_fields(fields: &[&DecodedValue], metadata: &Metadata) -> DispatchError {
    let inner = fields.first().and_then(|v| variant_composite(*v).map(composite_values).or_else(|| match &v.value {
        scale_value::ValueDef::Composite(c) => Some(composite_values(c)),
        _ => None,
    }));
    let Some(inner) = inner else {
        return DispatchError::Unknown(Vec::new());
    };
    let pallet_index = inner.first().and_then(|v| value_as_u128(*v)).unwrap_or(0) as u8;
    let error_bytes = inner.get(1).map(|v| value_as_bytes(*v)).unwrap_or_default();
    let error_index = error_bytes.first().copied().unwrap_or(0);

    let (pallet_name, error_name, docs) = match metadata.error_variant(pallet_index, error_index) {
        Ok((pallet, variant)) => (Some(pallet.to_owned()), Some(variant.name().clone()), variant.docs().to_vec()),
        Err(_) => (None, None, Vec::new()),
    };

    DispatchError::Module(ModuleError { pallet_index, error_index, pallet_name, error_name, docs })
}

fn token_error_from_fields(fields: &[&DecodedValue]) -> TokenError {
    match fields.first().and_then(|v| variant_name(*v)) {
        Some("FundsUnavailable") => TokenError::FundsUnavailable,
        Some("BelowMinimum") => TokenError::BelowMinimum,
        Some("CannotCreate") => TokenError::CannotCreate,
        Some("UnknownAsset") => TokenError::UnknownAsset,
        Some("Frozen") => TokenError::Frozen,
        Some("Unsupported") => TokenError::Unsupported,
        Some("NotExpendable") => TokenError::NotExpendable,
        _ => TokenError::Other,
    }
}

fn arithmetic_error_from_fields(fields: &[&DecodedValue]) -> ArithmeticError {
    match fields.first().and_then(|v| variant_name(*v)) {
        Some("Underflow") => ArithmeticError::Underflow,
        Some("Overflow") => ArithmeticError::Overflow,
        _ => ArithmeticError::DivisionByZero,
    }
}

fn transactional_error_from_fields(fields: &[&DecodedValue]) -> TransactionalError {
    match fields.first().and_then(|v| variant_name(*v)) {
        Some("LimitReached") => TransactionalError::LimitReached,
        _ => TransactionalError::NoLayer,
    }
}

fn parse_tx_status(value: &serde_json::Value) -> Result<TxStatus, Error> {
    use serde_json::Value as J;
    match value {
        J::String(s) if s == "future" => Ok(TxStatus::Future),
        J::String(s) if s == "ready" => Ok(TxStatus::Ready),
        J::String(s) if s == "dropped" => Ok(TxStatus::Dropped),
        J::String(s) if s == "invalid" => Ok(TxStatus::Invalid),
        J::Object(obj) => {
            let (key, val) = obj
                .iter()
                .next()
                .ok_or_else(|| Error::Other("empty transaction status object".to_owned()))?;
            match key.as_str() {
                "broadcast" => {
                    let peers: Vec<String> = serde_json::from_value(val.clone())?;
                    Ok(TxStatus::Broadcast(peers))
                }
                "inBlock" => Ok(TxStatus::InBlock(parse_hash(val)?)),
                "retracted" => Ok(TxStatus::Retracted(parse_hash(val)?)),
                "finalityTimeout" => Ok(TxStatus::FinalityTimeout(parse_hash(val)?)),
                "finalized" => Ok(TxStatus::Finalized(parse_hash(val)?)),
                "usurped" => Ok(TxStatus::Usurped(parse_hash(val)?)),
                other => Err(Error::Other(format!("unknown transaction status '{other}'"))),
            }
        }
        other => Err(Error::Other(format!("unexpected transaction status shape: {other}"))),
    }
}

fn parse_hash(value: &serde_json::Value) -> Result<Hash, Error> {
    let s = value.as_str().ok_or_else(|| Error::Other("expected a hex hash string".to_owned()))?;
    serde_json::from_value(serde_json::Value::String(s.to_owned())).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_immortal_round_trip() {
        let mut bytes = Vec::new();
        Era::Immortal.encode_to(&mut bytes);
        assert_eq!(bytes, vec![0]);
    }

    #[test]
    fn era_mortal_round_trips_through_decode() {
        let era = Era::mortal(64, 100);
        let mut bytes = Vec::new();
        era.encode_to(&mut bytes);
        let decoded = Era::decode(&mut &bytes[..]).unwrap();
        assert_eq!(era, decoded);
    }

    #[test]
    fn parse_tx_status_strings() {
        assert!(matches!(parse_tx_status(&serde_json::json!("ready")).unwrap(), TxStatus::Ready));
        assert!(matches!(parse_tx_status(&serde_json::json!("future")).unwrap(), TxStatus::Future));
    }

    #[test]
    fn parse_tx_status_broadcast() {
        let v = serde_json::json!({"broadcast": ["peer1", "peer2"]});
        match parse_tx_status(&v).unwrap() {
            TxStatus::Broadcast(peers) => assert_eq!(peers, vec!["peer1".to_owned(), "peer2".to_owned()]),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
