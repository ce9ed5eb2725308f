//! # Protocol Configuration & Constants
//!
//! Every fixed parameter of the transaction core lives here. Changing any
//! of these after signatures have been issued invalidates those signatures
//! (or the addresses derived from them), so treat this file as frozen once
//! a deployment has real data.

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// The protocol version string reported by the node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Signature scheme used for every transaction.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 secret key length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes. Always 64.
pub const SIGNATURE_LENGTH: usize = 64;

/// Signature length once hex-encoded.
pub const SIGNATURE_HEX_LENGTH: usize = SIGNATURE_LENGTH * 2;

/// Hash used for the canonical transaction digest.
pub const DIGEST_FUNCTION: &str = "SHA-256";

/// Digest length in bytes.
pub const DIGEST_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Number of raw bytes in an address. 20 bytes keeps addresses short enough
/// to paste while leaving 160 bits of collision resistance headroom.
pub const ADDRESS_LENGTH: usize = 20;

/// Address length once hex-encoded. Request validation enforces exactly this.
pub const ADDRESS_HEX_LENGTH: usize = ADDRESS_LENGTH * 2;

/// BLAKE3 `derive_key` context for address derivation. Part of the address
/// format: changing it changes every address.
pub const ADDRESS_DERIVATION_CONTEXT: &str = "coinlet 2024-01-01 address derivation v1";

// ---------------------------------------------------------------------------
// Key Registry
// ---------------------------------------------------------------------------

/// Name of the sled tree holding address -> public key entries.
pub const KEY_REGISTRY_TREE: &str = "public_keys";
