//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **SHA-256** produces the canonical digest of structured values. It is
//!   the message every transaction signature covers, so it is the one hash
//!   here that must never change.
//!
//! - **BLAKE3** (in `derive_key` mode) is used for address derivation, where
//!   domain separation from every other use of the public key matters more
//!   than compatibility.
//!
//! ## Canonical encoding
//!
//! [`canonical_hash`] hashes the compact JSON encoding of a value. serde's
//! derived `Serialize` emits struct fields in declaration order, so the same
//! struct with the same values always yields the same bytes. Reordering the
//! fields of a hashed struct is a breaking change: every previously issued
//! signature over it stops verifying.

use serde::Serialize;
use sha2::{Digest as _, Sha256};
use std::fmt;
use thiserror::Error;

use crate::config::DIGEST_LENGTH;

/// Errors produced while hashing structured data.
#[derive(Debug, Error)]
pub enum HashError {
    /// The value could not be encoded canonically (e.g. a map with
    /// non-string keys).
    #[error("canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// A 32-byte SHA-256 digest of a canonically encoded value.
///
/// This is what gets signed. Carrying it as its own type (rather than a
/// bare `[u8; 32]` or `String`) keeps callers from signing arbitrary bytes
/// that were never run through [`canonical_hash`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LENGTH]);

impl Digest {
    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    /// Lowercase hex rendering, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Hash functions
// ---------------------------------------------------------------------------

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use coinlet_protocol::crypto::sha256;
///
/// let hash = sha256(b"coinlet");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// Same data under different contexts never collides, because the context
/// string selects a different internal IV.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Deterministic digest of a structured value.
///
/// Encodes `value` as compact JSON and hashes the bytes with SHA-256.
/// Identical structure (same keys, same order, same values) always yields
/// the same digest; changing any field changes it.
///
/// # Example
///
/// ```
/// use coinlet_protocol::crypto::canonical_hash;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Memo<'a> { to: &'a str, amount: i64 }
///
/// let a = canonical_hash(&Memo { to: "bob", amount: 5 }).unwrap();
/// let b = canonical_hash(&Memo { to: "bob", amount: 5 }).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<Digest, HashError> {
    let encoded = serde_json::to_vec(value)?;
    Ok(Digest(sha256(&encoded)))
}
