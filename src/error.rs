//! The error types returned from every layer of the client.
//!
//! Mirrors the split used by `subxt`'s `error` module: a root [`Error`] that
//! aggregates lower-level, independently matchable error enums via `#[from]`.

use crate::metadata::StorageHasher;

/// The top level error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An error talking to the node over the wire.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    /// A SCALE codec error.
    #[error("Scale codec error: {0}")]
    Codec(#[from] codec::Error),
    /// Serde (de)serialization error.
    #[error("Serde json error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Error working with metadata.
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
    /// Error decoding a dynamic value.
    #[error("Error decoding a dynamic value: {0}")]
    Decode(#[from] scale_decode::Error),
    /// Error encoding a dynamic value.
    #[error("Error encoding a dynamic value: {0}")]
    Encode(#[from] scale_encode::Error),
    /// A dispatch (runtime) error returned for a submitted extrinsic.
    #[error("Runtime dispatch error: {0}")]
    Runtime(#[from] DispatchError),
    /// Error composing or decoding a storage address/key.
    #[error("Storage address error: {0}")]
    StorageAddress(#[from] StorageAddressError),
    /// Error tracking a submitted transaction.
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
    /// More than one of `(block, block_hash, reuse_block)` was supplied.
    #[error("At most one of block, block_hash, reuse_block may be given")]
    AmbiguousBlockReference,
    /// The requested subnet does not exist.
    #[error("Subnet {0} not found")]
    SubnetNotFound(u16),
    /// A weight-setting attempt was made before the subnet's rate limit elapsed.
    #[error("Too soon to set weights for netuid {netuid}: {blocks_remaining} blocks remaining")]
    TooSoonToSetWeights {
        /// The subnet in question.
        netuid: u16,
        /// Blocks remaining until the rate limit is satisfied.
        blocks_remaining: u64,
    },
    /// The configured wallet failed to produce a signature.
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    /// `sign_with` was not one of `coldkey`, `hotkey`, `coldkeypub`.
    #[error("Invalid sign_with value: {0}")]
    InvalidSignWith(String),
    /// A parameter required by a runtime API method was not supplied.
    #[error("Missing runtime API parameter: {0}")]
    MissingParam(String),
    /// Catch-all for conditions that don't warrant their own variant.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_owned())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

/// Errors surfaced by the WebSocket transport (component A).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RpcError {
    /// The client took longer than its deadline to respond.
    #[error("RPC call timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// The initial TCP/TLS connection was refused.
    #[error("Connection refused connecting to {0}")]
    ConnectionRefused(String),
    /// The TLS handshake failed.
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),
    /// The socket was lost and reconnection has been initiated; retry the call.
    #[error("Connection lost, reconnecting")]
    Reconnected,
    /// The connection was closed by the caller.
    #[error("Connection closed")]
    ConnectionClosed,
    /// The response body couldn't be decoded as the expected JSON shape.
    #[error("Failed to decode RPC response: {0}")]
    DecodeError(String),
    /// The node returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    RpcError {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
        /// Optional additional data attached to the error.
        data: Option<serde_json::Value>,
    },
    /// The subscription was dropped (server or client side).
    #[error("Subscription dropped")]
    SubscriptionDropped,
}

/// Errors from resolving/composing a storage key or address (component D).
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageAddressError {
    /// More keys were supplied than the storage entry declares hashers for.
    #[error("Storage lookup requires {expected} keys but more keys were given")]
    TooManyKeys {
        /// The number of keys the entry expects.
        expected: usize,
    },
    /// The metadata's hasher list doesn't match its key-type list in length.
    #[error("Storage entry has {hashers} hashers but {fields} key fields")]
    WrongNumberOfHashers {
        /// Number of hashers declared.
        hashers: usize,
        /// Number of key type fields declared.
        fields: usize,
    },
    /// A hasher that doesn't preserve the original value was used where we need to decode it back.
    #[error(
        "Cannot reconstruct a key of type {ty_id} hashed with {hasher:?}; only concat-style or identity hashers preserve the original bytes"
    )]
    HasherCannotReconstructKey {
        /// The key's type id.
        ty_id: u32,
        /// The hasher that was used.
        hasher: StorageHasher,
    },
    /// The pallet named in a storage/call/constant lookup doesn't exist.
    #[error("Pallet '{0}' not found in metadata")]
    PalletNotFound(String),
    /// The storage/call/constant item named doesn't exist in the pallet.
    #[error("Item '{0}' not found in pallet '{1}'")]
    ItemNotFound(String, String),
}

/// Errors tracking the progress of a submitted extrinsic (component G).
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum TransactionError {
    /// The block the extrinsic was included in could no longer be found (a retracted fork).
    #[error("The block containing the transaction could not be found")]
    BlockHashNotFound,
    /// The watch subscription ended without the extrinsic reaching a block within 512 blocks.
    #[error("Finality subscription timed out")]
    FinalitySubscriptionTimeout,
    /// The node rejected the extrinsic as invalid before it entered the pool.
    #[error("Transaction is invalid: {0}")]
    Invalid(String),
    /// The transaction was dropped from the pool.
    #[error("Transaction was dropped: {0}")]
    Dropped(String),
}

/// Errors resolving details in the metadata (component B).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum MetadataError {
    /// The `DispatchError` type isn't present in this metadata.
    #[error("The DispatchError type isn't available in this metadata")]
    DispatchErrorNotFound,
    /// A referenced type id has no entry in the portable registry.
    #[error("Type with id {0} not found")]
    TypeNotFound(u32),
    /// No pallet with this index.
    #[error("Pallet with index {0} not found")]
    PalletIndexNotFound(u8),
    /// No pallet with this name.
    #[error("Pallet with name {0} not found")]
    PalletNameNotFound(String),
    /// No error/event/call variant with this index.
    #[error("Variant with index {0} not found")]
    VariantIndexNotFound(u8),
    /// No constant with this name in the pallet.
    #[error("Constant with name {0} not found")]
    ConstantNameNotFound(String),
    /// No call with this name in the pallet.
    #[error("Call with name {0} not found")]
    CallNameNotFound(String),
    /// No storage entry with this name in the pallet.
    #[error("Storage entry {0} not found")]
    StorageEntryNotFound(String),
    /// No runtime API trait with this name in the custom type registry.
    #[error("Runtime API trait '{0}' not found")]
    RuntimeTraitNotFound(String),
    /// No runtime API method with this name on the trait.
    #[error("Runtime API method '{0}' not found")]
    RuntimeMethodNotFound(String),
    /// Fetching or decoding the metadata blob itself failed; fatal for the session.
    #[error("Failed to fetch or decode runtime metadata: {0}")]
    FetchFailed(String),
}

/// A runtime (`DispatchError`) error returned when an extrinsic fails to apply.
///
/// This follows `sp_runtime::DispatchError`'s shape closely enough that we can
/// decode into it dynamically using the metadata's error-enum type id.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum DispatchError {
    /// Some error occurred.
    #[error("Some unknown error occurred")]
    Other,
    /// Failed to look up some data.
    #[error("Failed to look up some data")]
    CannotLookup,
    /// A bad origin.
    #[error("Bad origin")]
    BadOrigin,
    /// A custom error in a pallet.
    #[error("Pallet error: {0}")]
    Module(ModuleError),
    /// At least one consumer remains, so the account cannot be destroyed.
    #[error("At least one consumer is remaining so the account cannot be destroyed")]
    ConsumerRemaining,
    /// There are no providers, so the account cannot be created.
    #[error("No providers so account cannot be created")]
    NoProviders,
    /// Too many consumers for the account to be created.
    #[error("Too many consumers")]
    TooManyConsumers,
    /// A token-related dispatch error.
    #[error("Token error: {0:?}")]
    Token(TokenError),
    /// An arithmetic dispatch error.
    #[error("Arithmetic error: {0:?}")]
    Arithmetic(ArithmeticError),
    /// A transactional-layer dispatch error.
    #[error("Transactional error: {0:?}")]
    Transactional(TransactionalError),
    /// Resources exhausted.
    #[error("Resources exhausted")]
    Exhausted,
    /// State is corrupt.
    #[error("State is corrupt")]
    Corruption,
    /// A resource is temporarily unavailable.
    #[error("Resource unavailable")]
    Unavailable,
    /// Bytes we could not decode into any of the above shapes.
    #[error("Undecodable dispatch error bytes: {0:?}")]
    Unknown(Vec<u8>),
}

/// Details about a module (pallet) dispatch error, naming the offending pallet/error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModuleError {
    /// Index of the pallet that raised the error.
    pub pallet_index: u8,
    /// Index of the error variant within that pallet's `Error` enum.
    pub error_index: u8,
    /// Human-readable pallet name, if it could be resolved from metadata.
    pub pallet_name: Option<String>,
    /// Human-readable error variant name, if it could be resolved from metadata.
    pub error_name: Option<String>,
    /// The error variant's doc strings, if resolved from metadata.
    pub docs: Vec<String>,
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.pallet_name, &self.error_name) {
            (Some(p), Some(e)) => write!(f, "{p}::{e}"),
            _ => write!(
                f,
                "pallet index {} error index {}",
                self.pallet_index, self.error_index
            ),
        }
    }
}

/// Token-related dispatch errors, decoded from the runtime's `TokenError` enum.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenError {
    /// Funds are unavailable.
    FundsUnavailable,
    /// Account cannot exist with the funds that would be given.
    BelowMinimum,
    /// Account cannot be created.
    CannotCreate,
    /// The asset in question is unknown.
    UnknownAsset,
    /// Funds exist but are frozen.
    Frozen,
    /// Operation is not supported for this asset.
    Unsupported,
    /// Withdrawal would cause unwanted loss of the account.
    NotExpendable,
    /// Other token error not represented above.
    Other,
}

/// Arithmetic dispatch errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArithmeticError {
    /// Underflow.
    Underflow,
    /// Overflow.
    Overflow,
    /// Division by zero.
    DivisionByZero,
}

/// Transactional-layer dispatch errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionalError {
    /// Too many transactional layers have been spawned.
    LimitReached,
    /// A transactional layer was expected but does not exist.
    NoLayer,
}
