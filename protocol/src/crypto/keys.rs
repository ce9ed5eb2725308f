//! # Key Management
//!
//! Ed25519 keypairs, public keys, and signatures for Coinlet accounts.
//!
//! An account is nothing more than a keypair: the public key derives the
//! account's address (see [`super::address`]) and the secret key signs
//! transfers out of it.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop by ed25519-dalek.
//! - Key generation uses the OS RNG (`OsRng`).
//! - Secret key bytes never appear in `Debug` output or log events.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use crate::config::{SIGNATURE_LENGTH, SIGNING_KEY_LENGTH, VERIFYING_KEY_LENGTH};

/// Errors that can occur during key operations.
///
/// Deliberately vague about *why* something failed, so error messages never
/// carry fragments of key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key: expected 32 bytes of hex")]
    InvalidSecretKey,

    #[error("invalid public key: expected 32 bytes encoding an Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature: expected 64 bytes of hex")]
    InvalidSignature,
}

// ---------------------------------------------------------------------------
// CoinletKeypair
// ---------------------------------------------------------------------------

/// An Ed25519 keypair controlling one Coinlet address.
///
/// Intentionally not `Serialize`: exporting a secret key should be an
/// explicit call to [`secret_key_hex`](Self::secret_key_hex), never a side
/// effect of putting a keypair into a JSON response.
///
/// # Examples
///
/// ```
/// use coinlet_protocol::crypto::keys::CoinletKeypair;
///
/// let kp = CoinletKeypair::generate();
/// let msg = b"send 50 to bob";
/// let sig = kp.sign(msg);
/// assert!(kp.public_key().verify(msg, &sig));
/// ```
pub struct CoinletKeypair {
    signing_key: SigningKey,
}

impl CoinletKeypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed, so this is also the
    /// inverse of [`secret_key_bytes`](Self::secret_key_bytes).
    pub fn from_seed(seed: &[u8; SIGNING_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded 32-byte secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SIGNING_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> CoinletPublicKey {
        CoinletPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Ed25519 signatures are deterministic: the same key and
    /// message always produce the same signature.
    pub fn sign(&self, message: &[u8]) -> CoinletSignature {
        CoinletSignature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Raw 32-byte secret key. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SIGNING_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Hex-encoded secret key, for the CLI `keygen` output and tests.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key_bytes())
    }
}

impl Clone for CoinletKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for CoinletKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only.
        write!(f, "CoinletKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// CoinletPublicKey
// ---------------------------------------------------------------------------

/// The public half of a keypair. Safe to share, log, and store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinletPublicKey {
    bytes: [u8; VERIFYING_KEY_LENGTH],
}

impl CoinletPublicKey {
    /// Try to create a public key from a byte slice.
    ///
    /// Validates both the length and that the bytes decode to a point on the
    /// curve; not every 32-byte string is a usable Ed25519 key.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; VERIFYING_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded public key (64 hex characters).
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; VERIFYING_KEY_LENGTH] {
        &self.bytes
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verify a signature over `message`.
    ///
    /// Returns a plain boolean: callers want yes/no, and a detailed failure
    /// reason would only serve as an oracle.
    pub fn verify(&self, message: &[u8], signature: &CoinletSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Some(dalek_sig) = signature.to_dalek_signature() else {
            return false;
        };
        verifying_key.verify(message, &dalek_sig).is_ok()
    }
}

impl Hash for CoinletPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for CoinletPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CoinletPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoinletPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// CoinletSignature
// ---------------------------------------------------------------------------

/// An Ed25519 signature. Always 64 bytes when produced by [`CoinletKeypair`];
/// anything else simply fails verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinletSignature {
    bytes: Vec<u8>,
}

impl CoinletSignature {
    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex, 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature. Rejects anything but exactly 64 bytes.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidSignature)?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }

    fn to_dalek_signature(&self) -> Option<DalekSignature> {
        let arr: [u8; SIGNATURE_LENGTH] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }
}

impl fmt::Display for CoinletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CoinletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "CoinletSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "CoinletSignature({})", hex_str)
        }
    }
}
