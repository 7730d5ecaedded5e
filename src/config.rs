//! Chain identity types and endpoint resolution.
//!
//! `AccountId32` and `MultiSignature` are adapted near-verbatim from
//! `subxt`'s `utils/account_id.rs` and `utils/multi_signature.rs` - simple,
//! dependency-light stand-ins for the full `sp_core` types.

use codec::{Decode, Encode};
use serde::Serialize;

/// Block hash type used throughout this crate.
pub type Hash = primitive_types::H256;

/// Block number type used throughout this crate.
pub type BlockNumber = u64;

/// The SS58 network byte used for addresses on this chain (generic Substrate).
pub const SS58_PREFIX: u8 = 42;

/// A 32-byte account identifier with SS58 display/parse support.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Encode, Decode, Debug, Hash)]
pub struct AccountId32(pub [u8; 32]);

impl AsRef<[u8]> for AccountId32 {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl AsRef<[u8; 32]> for AccountId32 {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for AccountId32 {
    fn from(x: [u8; 32]) -> Self {
        AccountId32(x)
    }
}

impl AccountId32 {
    /// Encode this account id as an SS58 address string using [`SS58_PREFIX`].
    pub fn to_ss58check(&self) -> String {
        let mut v = vec![SS58_PREFIX];
        v.extend(&self.0);
        let checksum = ss58_checksum(&v);
        v.extend(&checksum[0..2]);
        use base58::ToBase58;
        v.to_base58()
    }

    /// Parse an SS58 address string into an account id, validating its checksum.
    pub fn from_ss58check(s: &str) -> Result<Self, FromSs58Error> {
        const CHECKSUM_LEN: usize = 2;
        const BODY_LEN: usize = 32;

        use base58::FromBase58;
        let data = s.from_base58().map_err(|_| FromSs58Error::BadBase58)?;
        if data.len() < 2 {
            return Err(FromSs58Error::BadLength);
        }
        let prefix_len = match data[0] {
            0..=63 => 1,
            64..=127 => 2,
            _ => return Err(FromSs58Error::InvalidPrefix),
        };
        if data.len() != prefix_len + BODY_LEN + CHECKSUM_LEN {
            return Err(FromSs58Error::BadLength);
        }
        let hash = ss58_checksum(&data[0..BODY_LEN + prefix_len]);
        let checksum = &hash[0..CHECKSUM_LEN];
        if data[BODY_LEN + prefix_len..BODY_LEN + prefix_len + CHECKSUM_LEN] != *checksum {
            return Err(FromSs58Error::InvalidChecksum);
        }

        let result: [u8; BODY_LEN] = data[prefix_len..BODY_LEN + prefix_len]
            .try_into()
            .map_err(|_| FromSs58Error::BadLength)?;
        Ok(AccountId32(result))
    }
}

/// An error parsing an SS58-encoded address.
#[derive(thiserror::Error, Clone, Copy, Eq, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum FromSs58Error {
    #[error("Base58 requirement is violated")]
    BadBase58,
    #[error("Length is bad")]
    BadLength,
    #[error("Invalid checksum")]
    InvalidChecksum,
    #[error("Invalid SS58 prefix byte")]
    InvalidPrefix,
}

fn ss58_checksum(data: &[u8]) -> Vec<u8> {
    use blake2::{Blake2b512, Digest};
    const PREFIX: &[u8] = b"SS58PRE";
    let mut ctx = Blake2b512::new();
    ctx.update(PREFIX);
    ctx.update(data);
    ctx.finalize().to_vec()
}

impl Serialize for AccountId32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_ss58check())
    }
}

impl<'de> serde::Deserialize<'de> for AccountId32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AccountId32::from_ss58check(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for AccountId32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_ss58check())
    }
}

impl std::str::FromStr for AccountId32 {
    type Err = FromSs58Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountId32::from_ss58check(s)
    }
}

/// A signature produced by a [`crate::tx::signer::Wallet`].
#[derive(Clone, Eq, PartialEq, Encode, Decode, Debug)]
pub enum MultiSignature {
    /// An Ed25519 signature.
    Ed25519([u8; 64]),
    /// An Sr25519 signature.
    Sr25519([u8; 64]),
}

/// A named network, or an arbitrary WebSocket endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Endpoint {
    /// `wss://entrypoint-finney.opentensor.ai:443`
    Finney,
    /// `wss://test.finney.opentensor.ai:443`
    Test,
    /// `wss://archive.chain.opentensor.ai:443`
    Archive,
    /// `ws://127.0.0.1:9944`
    Local,
    /// An arbitrary endpoint URL.
    Custom(String),
}

impl Endpoint {
    /// Resolve to the literal WebSocket URL to connect to.
    ///
    /// Per §6: URLs lacking a `ws://`/`wss://` scheme get `ws://` prepended.
    pub fn url(&self) -> String {
        match self {
            Endpoint::Finney => "wss://entrypoint-finney.opentensor.ai:443".to_owned(),
            Endpoint::Test => "wss://test.finney.opentensor.ai:443".to_owned(),
            Endpoint::Archive => "wss://archive.chain.opentensor.ai:443".to_owned(),
            Endpoint::Local => "ws://127.0.0.1:9944".to_owned(),
            Endpoint::Custom(raw) => normalize_ws_url(raw),
        }
    }
}

fn normalize_ws_url(raw: &str) -> String {
    if raw.starts_with("ws://") || raw.starts_with("wss://") {
        raw.to_owned()
    } else {
        format!("ws://{raw}")
    }
}

impl std::str::FromStr for Endpoint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "finney" => Endpoint::Finney,
            "test" => Endpoint::Test,
            "archive" => Endpoint::Archive,
            "local" => Endpoint::Local,
            other => Endpoint::Custom(other.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_endpoints_resolve() {
        assert_eq!(
            Endpoint::Finney.url(),
            "wss://entrypoint-finney.opentensor.ai:443"
        );
        assert_eq!(Endpoint::Local.url(), "ws://127.0.0.1:9944");
    }

    #[test]
    fn custom_endpoint_gets_ws_scheme_prepended() {
        let ep: Endpoint = "example.com:9944".parse().unwrap();
        assert_eq!(ep.url(), "ws://example.com:9944");
    }

    #[test]
    fn custom_endpoint_keeps_existing_scheme() {
        let ep: Endpoint = "wss://example.com:443".parse().unwrap();
        assert_eq!(ep.url(), "wss://example.com:443");
    }

    #[test]
    fn ss58_round_trip() {
        let id = AccountId32([7u8; 32]);
        let s = id.to_ss58check();
        let back = AccountId32::from_ss58check(&s).unwrap();
        assert_eq!(id, back);
    }
}
