//! Operator key management and signing.
//!
//! # Responsibilities
//! - Load the operator keypair from the environment (never from config files)
//! - Derive ledger addresses from verifying keys
//! - Produce detached signatures over transaction digests
//!
//! # Design Decisions
//! - Key material is read exclusively from `RELAY_OPERATOR_KEY`. It is never
//!   logged, serialized, or exposed through `Debug`.
//! - Fresh single-use keypairs for credit delegation are generated from the
//!   OS entropy source and dropped after signing.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use super::types::{ChainError, ChainResult};

/// Environment variable holding the operator's hex-encoded 32-byte seed.
pub const OPERATOR_KEY_ENV_VAR: &str = "RELAY_OPERATOR_KEY";

/// Number of digest bytes used to form a ledger address.
const ADDRESS_BYTES: usize = 20;

/// An ed25519 keypair that can sign transaction digests.
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Parses a keypair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> ChainResult<Self> {
        let trimmed = seed_hex.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed)
            .map_err(|e| ChainError::Key(format!("invalid hex seed: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::Key("seed must be exactly 32 bytes".to_string()))?;
        Ok(Self {
            signing: SigningKey::from_bytes(&seed),
        })
    }

    /// Loads the operator keypair from [`OPERATOR_KEY_ENV_VAR`].
    pub fn from_env() -> ChainResult<Self> {
        let seed = std::env::var(OPERATOR_KEY_ENV_VAR).map_err(|_| {
            ChainError::Key(format!(
                "environment variable {} is not set",
                OPERATOR_KEY_ENV_VAR
            ))
        })?;
        Self::from_seed_hex(&seed)
    }

    /// Generates a fresh keypair from OS entropy.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derives the ledger address for this keypair.
    ///
    /// The address is the hex encoding of the first 20 bytes of the
    /// SHA-256 digest of the verifying key.
    pub fn address(&self) -> String {
        address_of(&self.signing.verifying_key())
    }

    /// Signs a 32-byte digest, returning the signature as hex.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> String {
        hex::encode(self.signing.sign(digest).to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

/// Derives the ledger address for a verifying key.
pub fn address_of(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..ADDRESS_BYTES])
}
