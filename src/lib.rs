//! A typed async client core for a Substrate-based proof-of-stake chain:
//! connection/transport, metadata, storage reads, runtime API calls, block
//! resolution, extrinsic signing/submission, and commit-reveal weight
//! setting, composed into a single [`chain::Chain`] facade.
//!
//! ```no_run
//! # async fn go() -> Result<(), subtensor_client::Error> {
//! use subtensor_client::{Chain, Endpoint};
//!
//! let chain = Chain::connect(Endpoint::Finney).await?;
//! let block = chain.get_current_block().await?;
//! let neurons = chain.neurons(1, None).await?;
//! println!("block {block}, {} neurons on subnet 1", neurons.len());
//! # Ok(())
//! # }
//! ```
//!
//! Callers outside an existing Tokio runtime can reach for
//! [`chain::sync::SyncChain`] instead, which owns its own runtime and blocks.

pub mod block;
pub mod chain;
pub mod codec;
pub mod config;
pub mod error;
pub mod metadata;
pub mod records;
pub mod rpc;
pub mod runtime_api;
pub mod storage;
pub mod tx;
pub mod units;
pub mod weights;

pub use chain::sync::SyncChain;
pub use chain::Chain;
pub use config::{AccountId32, BlockNumber, Endpoint, Hash, MultiSignature};
pub use error::Error;
pub use units::Balance;
