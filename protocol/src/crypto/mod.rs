//! # Cryptographic Primitives
//!
//! The stateless half of the transaction core. Nothing in here holds state
//! or performs I/O; every function is a pure mapping from inputs to outputs.
//!
//! - **hash**: canonical SHA-256 digests of structured values.
//! - **address**: one-way address derivation from a public key.
//! - **keys**: Ed25519 keypairs, public keys, signatures.
//! - **signatures**: signing and verifying digests.
//!
//! Everything here wraps audited implementations (`ed25519-dalek`, `sha2`,
//! `blake3`). None of it implements cryptography itself.

pub mod address;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use address::{generate_address, Address, AddressError};
pub use hash::{canonical_hash, sha256, Digest, HashError};
pub use keys::{CoinletKeypair, CoinletPublicKey, CoinletSignature, KeyError};
pub use signatures::{sign_digest, verify_digest, verify_digest_hex};
