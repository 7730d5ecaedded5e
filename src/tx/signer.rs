//! Signing backends: a minimal [`Signer`] trait plus `sr25519`/`ed25519`
//! implementations, grounded on `subxt-signer`'s split between a signing
//! trait consumed by the transaction layer and concrete keypair backends.
//! Key generation/storage is explicitly out of scope (§1 Non-goal) — this
//! module only signs payloads handed to it by an already-constructed keypair.

use crate::config::{AccountId32, MultiSignature};
use crate::error::Error;

/// The well-known signing context substrate's sr25519 scheme signs under
/// (`sp_core::sr25519::SIGNING_CTX`), required for interoperability with any
/// node verifying the resulting signature.
const SR25519_SIGNING_CONTEXT: &[u8] = b"substrate";

/// Something that can produce a signature over an arbitrary payload, and
/// knows the account id/address it signs for.
pub trait Signer: Send + Sync {
    /// The account this signer signs on behalf of.
    fn account_id(&self) -> &AccountId32;

    /// Sign an already-assembled payload (raw bytes, or their blake2_256
    /// digest if longer than 256 bytes — the caller handles that).
    fn sign(&self, payload: &[u8]) -> MultiSignature;
}

/// An `sr25519` (schnorrkel) signing backend — the default scheme for
/// hotkey/coldkey accounts on this chain.
pub struct Sr25519Signer {
    account_id: AccountId32,
    keypair: schnorrkel::Keypair,
}

impl Sr25519Signer {
    /// Wrap an already-constructed schnorrkel keypair.
    pub fn new(keypair: schnorrkel::Keypair) -> Self {
        let account_id = AccountId32(keypair.public.to_bytes());
        Sr25519Signer { account_id, keypair }
    }

    /// Build from a raw 64-byte schnorrkel keypair encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let keypair = schnorrkel::Keypair::from_bytes(bytes)
            .map_err(|e| Error::SigningFailed(format!("invalid sr25519 keypair: {e}")))?;
        Ok(Sr25519Signer::new(keypair))
    }
}

impl Signer for Sr25519Signer {
    fn account_id(&self) -> &AccountId32 {
        &self.account_id
    }

    fn sign(&self, payload: &[u8]) -> MultiSignature {
        let context = schnorrkel::signing_context(SR25519_SIGNING_CONTEXT);
        let signature = self.keypair.sign(context.bytes(payload));
        MultiSignature::Sr25519(signature.to_bytes())
    }
}

/// An `ed25519` signing backend, offered as an alternate scheme (§9).
pub struct Ed25519Signer {
    account_id: AccountId32,
    signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519Signer {
    /// Wrap an already-constructed ed25519-dalek signing key.
    pub fn new(signing_key: ed25519_dalek::SigningKey) -> Self {
        let account_id = AccountId32(signing_key.verifying_key().to_bytes());
        Ed25519Signer { account_id, signing_key }
    }

    /// Build from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Ed25519Signer::new(ed25519_dalek::SigningKey::from_bytes(seed))
    }
}

impl Signer for Ed25519Signer {
    fn account_id(&self) -> &AccountId32 {
        &self.account_id
    }

    fn sign(&self, payload: &[u8]) -> MultiSignature {
        use ed25519_dalek::Signer as _;
        let signature = self.signing_key.sign(payload);
        MultiSignature::Ed25519(signature.to_bytes())
    }
}

/// Either signing backend behind one object, so callers needn't be generic
/// over the scheme.
pub enum Wallet {
    /// An `sr25519` keypair.
    Sr25519(Sr25519Signer),
    /// An `ed25519` keypair.
    Ed25519(Ed25519Signer),
}

impl Signer for Wallet {
    fn account_id(&self) -> &AccountId32 {
        match self {
            Wallet::Sr25519(s) => s.account_id(),
            Wallet::Ed25519(s) => s.account_id(),
        }
    }

    fn sign(&self, payload: &[u8]) -> MultiSignature {
        match self {
            Wallet::Sr25519(s) => s.sign(payload),
            Wallet::Ed25519(s) => s.sign(payload),
        }
    }
}

/// Which of a Bittensor wallet's keypairs a write operation should be signed
/// with — distinct accounts serve distinct roles on-chain (coldkey owns
/// funds/registrations, hotkey authenticates validator/miner activity).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignWith {
    /// Sign with the coldkey (funds, staking, registration ownership).
    Coldkey,
    /// Sign with the hotkey (validator/miner network identity).
    Hotkey,
    /// Sign with the coldkey's public-only counterpart (read-oriented calls
    /// that still require a "from" address, e.g. some RPC-level queries).
    ColdkeyPub,
}

impl std::str::FromStr for SignWith {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coldkey" => Ok(SignWith::Coldkey),
            "hotkey" => Ok(SignWith::Hotkey),
            "coldkeypub" => Ok(SignWith::ColdkeyPub),
            other => Err(Error::InvalidSignWith(other.to_owned())),
        }
    }
}

/// The account side of a [`SignWith`] choice: either a private-key-backed
/// [`Signer`] (for `coldkey`/`hotkey`) or a bare account id with no private
/// key available (for `coldkeypub`, which can only ever produce an unsigned
/// extrinsic).
pub enum SigningAccount<'a> {
    /// A full signing backend.
    Signer(&'a dyn Signer),
    /// Public key only — no private key, so nothing can be signed.
    PublicOnly(&'a AccountId32),
}

impl SigningAccount<'_> {
    /// The account id either side carries.
    pub fn account_id(&self) -> &AccountId32 {
        match self {
            SigningAccount::Signer(s) => s.account_id(),
            SigningAccount::PublicOnly(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn sr25519_signer_account_id_matches_public_key() {
        let keypair = schnorrkel::Keypair::generate_with(OsRng);
        let expected = keypair.public.to_bytes();
        let signer = Sr25519Signer::new(keypair);
        assert_eq!(signer.account_id().0, expected);
    }

    #[test]
    fn sr25519_signature_round_trip() {
        let keypair = schnorrkel::Keypair::generate_with(OsRng);
        let public = keypair.public;
        let signer = Sr25519Signer::new(keypair);
        let payload = b"hello chain";
        let MultiSignature::Sr25519(bytes) = signer.sign(payload) else {
            panic!("expected sr25519 signature");
        };
        let signature = schnorrkel::Signature::from_bytes(&bytes).unwrap();
        let context = schnorrkel::signing_context(SR25519_SIGNING_CONTEXT);
        assert!(public.verify(context.bytes(payload), &signature).is_ok());
    }

    #[test]
    fn sign_with_parses_known_values() {
        assert_eq!("coldkey".parse::<SignWith>().unwrap(), SignWith::Coldkey);
        assert_eq!("hotkey".parse::<SignWith>().unwrap(), SignWith::Hotkey);
        assert_eq!("coldkeypub".parse::<SignWith>().unwrap(), SignWith::ColdkeyPub);
        assert!("nonsense".parse::<SignWith>().is_err());
    }
}
