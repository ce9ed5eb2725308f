//! # Address Derivation
//!
//! A Coinlet address is a one-way function of a public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3 derive_key(ADDRESS_DERIVATION_CONTEXT, public_key)
//!     -> first 20 bytes
//!     -> lowercase hex (40 chars)
//! ```
//!
//! The same public key always yields the same address; recovering the key
//! from an address is infeasible. An address therefore proves nothing by
//! itself: to verify a transfer out of an address, the verifier needs the
//! public key that derives to it (see [`crate::registry`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::domain_separated_hash;
use super::keys::CoinletPublicKey;
use crate::config::{ADDRESS_DERIVATION_CONTEXT, ADDRESS_HEX_LENGTH, ADDRESS_LENGTH};

/// Errors produced when parsing an address string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must be {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("address contains non-hex characters")]
    InvalidHex,
}

/// A validated 40-character lowercase hex address.
///
/// Construction goes through [`Address::parse`] or [`generate_address`], so
/// holding an `Address` means the shape check already passed. Serde
/// deserialization runs the same check.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse an address, accepting either case and normalizing to lowercase.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.len() != ADDRESS_HEX_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_HEX_LENGTH,
                got: s.len(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

/// Derive the address controlled by `public_key`.
///
/// # Example
///
/// ```
/// use coinlet_protocol::crypto::{generate_address, CoinletKeypair};
///
/// let kp = CoinletKeypair::generate();
/// let address = generate_address(&kp.public_key());
/// assert_eq!(address.as_str().len(), 40);
/// assert_eq!(address, generate_address(&kp.public_key()));
/// ```
pub fn generate_address(public_key: &CoinletPublicKey) -> Address {
    let digest = domain_separated_hash(ADDRESS_DERIVATION_CONTEXT, public_key.as_bytes());
    Address(hex::encode(&digest[..ADDRESS_LENGTH]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::CoinletKeypair;

    #[test]
    fn derivation_is_deterministic() {
        let kp = CoinletKeypair::from_seed(&[7u8; 32]);
        assert_eq!(
            generate_address(&kp.public_key()),
            generate_address(&kp.public_key())
        );
    }

    #[test]
    fn different_keys_different_addresses() {
        let a = generate_address(&CoinletKeypair::generate().public_key());
        let b = generate_address(&CoinletKeypair::generate().public_key());
        assert_ne!(a, b);
    }

    #[test]
    fn derived_address_is_40_lowercase_hex() {
        let address = generate_address(&CoinletKeypair::generate().public_key());
        assert_eq!(address.as_str().len(), ADDRESS_HEX_LENGTH);
        assert!(address
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(Address::parse(address.as_str()).unwrap(), address);
    }

    #[test]
    fn address_is_not_a_prefix_of_the_public_key() {
        let pk = CoinletKeypair::generate().public_key();
        let address = generate_address(&pk);
        assert!(!pk.to_hex().starts_with(address.as_str()));
    }

    #[test]
    fn parse_normalizes_case() {
        let upper = "AB".repeat(20);
        let parsed = Address::parse(&upper).unwrap();
        assert_eq!(parsed.as_str(), "ab".repeat(20));
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert_eq!(
            Address::parse("abc").unwrap_err(),
            AddressError::InvalidLength {
                expected: 40,
                got: 3
            }
        );
        assert_eq!(
            Address::parse(&"g".repeat(40)).unwrap_err(),
            AddressError::InvalidHex
        );
    }

    #[test]
    fn serde_runs_the_shape_check() {
        let ok: Address = serde_json::from_str(&format!("\"{}\"", "0".repeat(40))).unwrap();
        assert_eq!(ok.as_str(), "0".repeat(40));
        assert!(serde_json::from_str::<Address>("\"addrA\"").is_err());
    }
}
