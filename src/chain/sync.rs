//! A synchronous façade over [`Chain`], for callers that aren't already
//! inside a Tokio runtime.
//!
//! Grounded on `examples/paritytech-subxt/src/lib.rs`'s `submit` function,
//! which owns a single-use `tokio::runtime::Runtime` and calls `block_on` on
//! it directly rather than reaching for a lazily-initialized global runtime.
//! Here the runtime is kept alive for the client's whole lifetime instead of
//! being single-use, since a CLI or script typically makes many calls against
//! one connection (§5: "the synchronous shim owns a dedicated
//! `tokio::runtime::Runtime` and blocks via `Handle::block_on`, never a
//! global/lazily-initialized runtime").

use std::future::Future;

use crate::config::{AccountId32, Endpoint, Hash};
use crate::error::Error;
use crate::records::{NeuronInfo, NeuronInfoLite};
use crate::tx::signer::Signer;
use crate::tx::TxParams;
use crate::units::Balance;

use super::Chain;

/// A blocking handle onto a [`Chain`], backed by its own multi-threaded Tokio
/// runtime. Each instance owns one connection and one runtime; don't build
/// one per call.
pub struct SyncChain {
    chain: Chain,
    runtime: tokio::runtime::Runtime,
}

impl SyncChain {
    /// Connect to `endpoint`, blocking until the connection and metadata
    /// fetch complete.
    pub fn connect(endpoint: Endpoint) -> Result<Self, Error> {
        let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Other(format!("failed to start Tokio runtime: {e}")))?;
        let chain = runtime.block_on(Chain::connect(endpoint))?;
        Ok(SyncChain { chain, runtime })
    }

    /// The underlying async client, for `self.block_on(self.chain().some_async_call(..))`.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Run any future against this client's runtime, blocking the calling
    /// thread until it resolves. Use this to reach facade methods this type
    /// doesn't wrap directly.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Blocking [`Chain::get_balance`].
    pub fn get_balance(&self, account: &AccountId32, at: Option<Hash>) -> Result<Balance, Error> {
        self.block_on(self.chain.get_balance(account, at))
    }

    /// Blocking [`Chain::get_current_block`].
    pub fn get_current_block(&self) -> Result<u64, Error> {
        self.block_on(self.chain.get_current_block())
    }

    /// Blocking [`Chain::neurons`].
    pub fn neurons(&self, netuid: u16, at: Option<Hash>) -> Result<Vec<NeuronInfo>, Error> {
        self.block_on(self.chain.neurons(netuid, at))
    }

    /// Blocking [`Chain::neurons_lite`].
    pub fn neurons_lite(&self, netuid: u16, at: Option<Hash>) -> Result<Vec<NeuronInfoLite>, Error> {
        self.block_on(self.chain.neurons_lite(netuid, at))
    }

    /// Blocking [`Chain::get_netuids_for_hotkey`].
    pub fn get_netuids_for_hotkey(&self, hotkey: &AccountId32, at: Option<Hash>) -> Result<Vec<u16>, Error> {
        self.block_on(self.chain.get_netuids_for_hotkey(hotkey, at))
    }

    /// Blocking [`Chain::transfer`].
    pub fn transfer(&self, signer: &dyn Signer, dest: &AccountId32, value: Balance, params: &TxParams) -> Result<Hash, Error> {
        self.block_on(self.chain.transfer(signer, dest, value, params))
    }

    /// Blocking [`Chain::add_stake`].
    pub fn add_stake(&self, signer: &dyn Signer, hotkey: &AccountId32, netuid: u16, amount: Balance, params: &TxParams) -> Result<Hash, Error> {
        self.block_on(self.chain.add_stake(signer, hotkey, netuid, amount, params))
    }

    /// Blocking [`Chain::set_weights`] (legacy, non-commit-reveal path).
    pub fn set_weights(
        &self,
        signer: &dyn Signer,
        netuid: u16,
        uids: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        params: &TxParams,
    ) -> Result<Hash, Error> {
        self.block_on(self.chain.set_weights(signer, netuid, uids, weights, version_key, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connecting_to_an_unroutable_address_fails_without_hanging() {
        // No live node to connect to in this test environment; the point is
        // just that `connect` returns an `Err` rather than panicking or
        // blocking forever, proving the owned runtime is torn down cleanly
        // on the error path.
        let result = SyncChain::connect(Endpoint::Custom("127.0.0.1:1".to_owned()));
        assert!(result.is_err());
    }
}
